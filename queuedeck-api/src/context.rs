//! Resolved queue list shared by all handlers

use futures::future::BoxFuture;
use queuedeck_core::{Queue, QueueError};
use std::future::Future;
use std::sync::Arc;

pub type QueueList = Vec<Arc<dyn Queue>>;

/// Asynchronous producer of the managed queues
pub type QueueFactory =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<QueueList, QueueError>> + Send>;

/// Where the managed queues come from
pub enum QueueSource {
    Static(QueueList),
    /// Invoked once, when the routes are registered
    Factory(QueueFactory),
}

impl QueueSource {
    pub fn factory<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<QueueList, QueueError>> + Send + 'static,
    {
        Self::Factory(Box::new(move || Box::pin(f())))
    }

    pub async fn resolve(self) -> Result<QueueList, QueueError> {
        match self {
            Self::Static(queues) => Ok(queues),
            Self::Factory(factory) => factory().await,
        }
    }
}

impl Default for QueueSource {
    fn default() -> Self {
        Self::Static(Vec::new())
    }
}

impl std::fmt::Debug for QueueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(queues) => f
                .debug_tuple("Static")
                .field(&queues.iter().map(|q| q.name()).collect::<Vec<_>>())
                .finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Queue list resolved at startup; never written afterwards
pub struct PanelContext {
    queues: QueueList,
}

impl PanelContext {
    pub fn new(queues: QueueList) -> Self {
        Self { queues }
    }

    pub async fn resolve(source: QueueSource) -> Result<Self, QueueError> {
        Ok(Self::new(source.resolve().await?))
    }

    pub fn queues(&self) -> &[Arc<dyn Queue>] {
        &self.queues
    }

    /// Exact-name lookup
    pub fn queue(&self, name: &str) -> Option<&Arc<dyn Queue>> {
        self.queues.iter().find(|q| q.name() == name)
    }
}

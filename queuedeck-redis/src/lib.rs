//! Redis store client for QueueDeck
//!
//! Answers the panel's `INFO` requests over a pooled connection.

use async_trait::async_trait;
use deadpool_redis::redis;
use queuedeck_core::{StoreClient, StoreError};
use tracing::debug;

/// Store client backed by a Redis connection pool
#[derive(Clone)]
pub struct RedisStore {
    pool: deadpool_redis::Pool,
}

impl RedisStore {
    pub fn new(pool: deadpool_redis::Pool) -> Self {
        Self { pool }
    }

    /// Build a pool for `url`; no connection is opened until first use
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &deadpool_redis::Pool {
        &self.pool
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    async fn info(&self) -> Result<String, StoreError> {
        let mut conn = self.connection().await?;
        let info: String = redis::cmd("INFO")
            .query_async(&mut *conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;
        debug!(bytes = info.len(), "Fetched INFO");
        Ok(info)
    }
}

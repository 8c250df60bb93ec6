//! In-process test server

use axum::Router;
use portpicker::pick_unused_port;
use queuedeck_api::PanelOptions;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::client::DeckClient;

/// A panel served on a random local port for the lifetime of the value
pub struct TestServer {
    handle: JoinHandle<()>,
    port: u16,
    base_url: String,
}

impl TestServer {
    /// Register the panel into an empty host router and serve it
    pub async fn start(options: PanelOptions) -> Result<Self, TestError> {
        let app = queuedeck_api::register(Router::new(), options)
            .await
            .map_err(|e| TestError::StartFailed(e.to_string()))?;
        Self::serve(app).await
    }

    /// Serve an already assembled router
    pub async fn serve(app: Router) -> Result<Self, TestError> {
        let port = pick_unused_port().ok_or(TestError::NoPortAvailable)?;
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| TestError::PortInUse(port))?;

        info!(port = port, "Starting QueueDeck test server");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Test server stopped");
            }
        });

        Ok(Self {
            handle,
            port,
            base_url: format!("http://127.0.0.1:{}", port),
        })
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a client for the panel routes mounted under `base_path`
    pub fn client(&self, base_path: &str) -> DeckClient {
        DeckClient::new(format!("{}{}", self.base_url, base_path))
    }

    /// Stop the server
    pub fn stop(&self) {
        info!(port = self.port, "Stopping QueueDeck test server");
        self.handle.abort();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Errors that can occur with test server
#[derive(Debug, Error)]
pub enum TestError {
    #[error("No available port found")]
    NoPortAvailable,

    #[error("Port {0} is already in use")]
    PortInUse(u16),

    #[error("Failed to start server: {0}")]
    StartFailed(String),
}

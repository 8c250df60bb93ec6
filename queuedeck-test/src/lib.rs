//! Test utilities for QueueDeck
//!
//! Serves the panel on a random local port and provides a client for its
//! routes:
//!
//! ```rust,no_run
//! use queuedeck_api::PanelOptions;
//! use queuedeck_test::TestServer;
//!
//! #[tokio::test]
//! async fn test_panel() {
//!     let server = TestServer::start(PanelOptions::default()).await.unwrap();
//!     let body = server.client("").queues_json(&[]).await.unwrap();
//!     assert_eq!(body["queues"], serde_json::json!([]));
//! }
//! ```

pub mod client;
pub mod server;

pub use client::{ClientError, DeckClient};
pub use server::{TestError, TestServer};

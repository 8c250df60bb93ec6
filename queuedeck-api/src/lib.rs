//! Queue monitoring and control routes for QueueDeck
//!
//! Mounts five REST routes into a host `axum::Router`:
//! - `GET {base}/queues`: store statistics plus counts and latest jobs per queue
//! - `PUT {base}/queues/:queue/retry`: retry every failed job
//! - `PUT {base}/queues/:queue/clean/:status`: remove old jobs in a status
//! - `PUT {base}/queues/:queue/jobs/:job/retry`: retry one job
//! - `PUT {base}/queues/:queue/jobs/:job/promote`: promote one delayed job

pub mod context;
pub mod controller;
mod error;
mod options;
mod routes;
pub mod stats;

#[cfg(test)]
mod tests;

pub use context::{PanelContext, QueueFactory, QueueList, QueueSource};
pub use error::PanelError;
pub use options::{AuthStrategy, PanelOptions, RouteOptions};
pub use routes::{normalize_base_path, panel_router, register};

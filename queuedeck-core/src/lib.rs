//! Core types and traits for QueueDeck
//!
//! This crate defines the collaborators the panel talks to (queues, jobs and
//! the backing store), the shared error types, and an in-memory backend.

pub mod error;
pub mod job;
pub mod memory;
pub mod queue;

pub use error::{ErrorBody, ErrorCode, QueueError, StoreError};
pub use job::{JobCounts, JobJson, JobOptions, JobStatus, StatusFilter};
pub use memory::{MemoryJob, MemoryQueue, StaticStore};
pub use queue::{Job, Queue, StoreClient};

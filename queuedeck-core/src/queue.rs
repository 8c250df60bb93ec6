//! Collaborator traits implemented by the embedding application

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{QueueError, StoreError};
use crate::job::{JobCounts, JobJson, JobOptions, JobStatus, StatusFilter};

/// Connection to the backing key-value store
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Raw `INFO` text, one `key:value` pair per line
    async fn info(&self) -> Result<String, StoreError>;
}

/// A single job handle
#[async_trait]
pub trait Job: Send + Sync {
    fn id(&self) -> &str;

    /// Snapshot of the job as a plain record
    fn to_json(&self) -> JobJson;

    fn opts(&self) -> &JobOptions;

    /// Move a failed job back to the waiting list
    async fn retry(&self) -> Result<(), QueueError>;

    /// Move a delayed job to the waiting list immediately
    async fn promote(&self) -> Result<(), QueueError>;
}

/// A named job queue
#[async_trait]
pub trait Queue: Send + Sync {
    fn name(&self) -> &str;

    /// Store connection used by this queue
    fn client(&self) -> Arc<dyn StoreClient>;

    /// Count jobs in each of the given statuses
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> Result<JobCounts, QueueError>;

    /// Jobs matching `filter` in the half-open window `[start, end)`
    async fn get_jobs(
        &self,
        filter: &StatusFilter,
        start: usize,
        end: usize,
    ) -> Result<Vec<Box<dyn Job>>, QueueError>;

    /// Look up a job by id
    async fn get_job(&self, id: &str) -> Result<Option<Box<dyn Job>>, QueueError>;

    /// Retry every failed job, returning how many were moved
    async fn retry_jobs(&self) -> Result<u64, QueueError>;

    /// Remove jobs in `status` older than `grace`, returning their ids
    async fn clean(&self, grace: Duration, status: &str) -> Result<Vec<String>, QueueError>;
}

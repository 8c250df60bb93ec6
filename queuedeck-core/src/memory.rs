//! In-memory queue backend
//!
//! Follows the queue library's job lifecycle closely enough to drive the
//! panel without an external store:
//! - `add` places a job in `waiting`, or `delayed` when `opts.delay > 0`
//! - `start`, `complete` and `fail` move jobs through `active`
//! - `retry` only applies to failed jobs, `promote` only to delayed ones

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::{QueueError, StoreError};
use crate::job::{JobCounts, JobJson, JobOptions, JobStatus, StatusFilter};
use crate::queue::{Job, Queue, StoreClient};

const DEFAULT_INFO: &str = "# Server\r\n\
redis_version:7.2.4\r\n\
redis_mode:standalone\r\n\
\r\n\
# Clients\r\n\
connected_clients:1\r\n\
blocked_clients:0\r\n\
\r\n\
# Memory\r\n\
used_memory:1048576\r\n\
total_system_memory:17179869184\r\n\
maxmemory:0\r\n\
mem_fragmentation_ratio:1.00\r\n";

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Store client answering `INFO` with a fixed payload
#[derive(Debug, Clone)]
pub struct StaticStore {
    info: String,
}

impl StaticStore {
    pub fn new(info: impl Into<String>) -> Self {
        Self { info: info.into() }
    }
}

impl Default for StaticStore {
    fn default() -> Self {
        Self::new(DEFAULT_INFO)
    }
}

#[async_trait]
impl StoreClient for StaticStore {
    async fn info(&self) -> Result<String, StoreError> {
        Ok(self.info.clone())
    }
}

#[derive(Debug, Clone)]
struct JobRecord {
    status: JobStatus,
    json: JobJson,
}

struct QueueInner {
    name: String,
    client: Arc<dyn StoreClient>,
    next_id: AtomicU64,
    jobs: DashMap<String, JobRecord>,
}

impl QueueInner {
    /// Apply `update` to job `id` if it is currently in `from`, then move it to `to`
    fn transition<F>(
        &self,
        id: &str,
        from: JobStatus,
        to: JobStatus,
        update: F,
    ) -> Result<(), QueueError>
    where
        F: FnOnce(&mut JobJson),
    {
        let mut record = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| QueueError::JobNotFound(id.to_string()))?;

        if record.status != from {
            return Err(QueueError::InvalidState {
                id: id.to_string(),
                reason: format!("job is {}, expected {}", record.status, from),
            });
        }

        update(&mut record.json);
        record.status = to;
        info!(queue = %self.name, job = %id, from = %from, to = %to, "Job moved");
        Ok(())
    }
}

/// Queue kept entirely in process memory
#[derive(Clone)]
pub struct MemoryQueue {
    inner: Arc<QueueInner>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>, client: Arc<dyn StoreClient>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                name: name.into(),
                client,
                next_id: AtomicU64::new(1),
                jobs: DashMap::new(),
            }),
        }
    }

    /// Queue backed by a [`StaticStore`] with the default payload
    pub fn with_static_store(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(StaticStore::default()))
    }

    /// Enqueue a job, returning its id
    pub fn add(&self, name: &str, data: serde_json::Value, opts: JobOptions) -> String {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let status = match opts.delay {
            Some(delay) if delay > 0 => JobStatus::Delayed,
            _ => JobStatus::Waiting,
        };

        let json = JobJson {
            id: id.clone(),
            name: name.to_string(),
            data,
            opts,
            progress: serde_json::json!(0),
            timestamp: now_millis(),
            processed_on: None,
            finished_on: None,
            attempts_made: 0,
            failed_reason: None,
            stacktrace: Vec::new(),
            returnvalue: serde_json::Value::Null,
        };

        info!(queue = %self.inner.name, job = %id, status = %status, "Added job");
        self.inner.jobs.insert(id.clone(), JobRecord { status, json });
        id
    }

    /// Move a waiting job to `active`
    pub fn start(&self, id: &str) -> Result<(), QueueError> {
        self.inner
            .transition(id, JobStatus::Waiting, JobStatus::Active, |job| {
                job.processed_on = Some(now_millis());
            })
    }

    /// Finish an active job successfully
    pub fn complete(&self, id: &str, returnvalue: serde_json::Value) -> Result<(), QueueError> {
        self.inner
            .transition(id, JobStatus::Active, JobStatus::Completed, |job| {
                job.finished_on = Some(now_millis());
                job.progress = serde_json::json!(100);
                job.returnvalue = returnvalue;
            })
    }

    /// Fail an active job with `reason`
    pub fn fail(&self, id: &str, reason: &str) -> Result<(), QueueError> {
        self.inner
            .transition(id, JobStatus::Active, JobStatus::Failed, |job| {
                job.finished_on = Some(now_millis());
                job.attempts_made += 1;
                job.failed_reason = Some(reason.to_string());
                job.stacktrace.push(format!("Error: {}", reason));
            })
    }

    /// Current status of a job
    pub fn status(&self, id: &str) -> Option<JobStatus> {
        self.inner.jobs.get(id).map(|r| r.status)
    }

    fn snapshot(&self, record: &JobRecord) -> MemoryJob {
        MemoryJob {
            json: record.json.clone(),
            queue: self.inner.clone(),
        }
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn client(&self) -> Arc<dyn StoreClient> {
        self.inner.client.clone()
    }

    async fn get_job_counts(&self, statuses: &[JobStatus]) -> Result<JobCounts, QueueError> {
        let mut counts: JobCounts = statuses.iter().map(|s| (*s, 0)).collect();
        for record in self.inner.jobs.iter() {
            if let Some(count) = counts.get_mut(&record.status) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    async fn get_jobs(
        &self,
        filter: &StatusFilter,
        start: usize,
        end: usize,
    ) -> Result<Vec<Box<dyn Job>>, QueueError> {
        // Unknown type names select nothing, like a lookup of a missing list
        let statuses: Vec<JobStatus> = match filter {
            StatusFilter::Default => JobStatus::ALL.to_vec(),
            StatusFilter::Types(types) => types.iter().filter_map(|t| t.parse().ok()).collect(),
        };

        let mut matching: Vec<JobRecord> = self
            .inner
            .jobs
            .iter()
            .filter(|r| statuses.contains(&r.status))
            .map(|r| r.value().clone())
            .collect();

        // Newest first
        matching.sort_by(|a, b| {
            b.json
                .timestamp
                .cmp(&a.json.timestamp)
                .then_with(|| numeric_id(&b.json.id).cmp(&numeric_id(&a.json.id)))
        });

        Ok(matching
            .iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .map(|r| Box::new(self.snapshot(r)) as Box<dyn Job>)
            .collect())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Box<dyn Job>>, QueueError> {
        Ok(self
            .inner
            .jobs
            .get(id)
            .map(|r| Box::new(self.snapshot(r.value())) as Box<dyn Job>))
    }

    async fn retry_jobs(&self) -> Result<u64, QueueError> {
        let failed: Vec<String> = self
            .inner
            .jobs
            .iter()
            .filter(|r| r.status == JobStatus::Failed)
            .map(|r| r.key().clone())
            .collect();

        let mut retried = 0;
        for id in failed {
            // A job may have been retried concurrently; skip it
            if self
                .inner
                .transition(&id, JobStatus::Failed, JobStatus::Waiting, reset_for_retry)
                .is_ok()
            {
                retried += 1;
            }
        }

        info!(queue = %self.inner.name, count = retried, "Retried failed jobs");
        Ok(retried)
    }

    async fn clean(&self, grace: Duration, status: &str) -> Result<Vec<String>, QueueError> {
        let status: JobStatus = status.parse()?;
        let grace_ms = i64::try_from(grace.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_millis().saturating_sub(grace_ms);

        let expired: Vec<String> = self
            .inner
            .jobs
            .iter()
            .filter(|r| {
                r.status == status && r.json.finished_on.unwrap_or(r.json.timestamp) <= cutoff
            })
            .map(|r| r.key().clone())
            .collect();

        for id in &expired {
            self.inner.jobs.remove(id);
        }

        info!(queue = %self.inner.name, status = %status, count = expired.len(), "Cleaned jobs");
        Ok(expired)
    }
}

fn numeric_id(id: &str) -> u64 {
    id.parse().unwrap_or(0)
}

fn reset_for_retry(job: &mut JobJson) {
    job.failed_reason = None;
    job.processed_on = None;
    job.finished_on = None;
}

/// Snapshot of a job in a [`MemoryQueue`]
pub struct MemoryJob {
    json: JobJson,
    queue: Arc<QueueInner>,
}

#[async_trait]
impl Job for MemoryJob {
    fn id(&self) -> &str {
        &self.json.id
    }

    fn to_json(&self) -> JobJson {
        self.json.clone()
    }

    fn opts(&self) -> &JobOptions {
        &self.json.opts
    }

    async fn retry(&self) -> Result<(), QueueError> {
        self.queue.transition(
            &self.json.id,
            JobStatus::Failed,
            JobStatus::Waiting,
            reset_for_retry,
        )
    }

    async fn promote(&self) -> Result<(), QueueError> {
        self.queue
            .transition(&self.json.id, JobStatus::Delayed, JobStatus::Waiting, |job| {
                job.opts.delay = Some(0);
            })
    }
}

//! Queue controller: one operation per panel route
//!
//! Each operation looks the queue up by exact name, delegates to the queue
//! library and reshapes the result. A missing queue or job is the only error
//! handled here; everything else is passed up unchanged.

use futures::future;
use queuedeck_core::{Job, JobCounts, JobJson, JobStatus, Queue, StatusFilter};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::context::PanelContext;
use crate::error::PanelError;
use crate::stats::{self, StoreStats};

/// Job listing window per queue, `[start, end)`
pub const JOB_PAGE_START: usize = 0;
pub const JOB_PAGE_END: usize = 10;

/// Minimum age of jobs removed by `clean`
pub const CLEAN_GRACE: Duration = Duration::from_millis(5000);

/// Query value selecting every known status
pub const LATEST: &str = "latest";

/// Query parameters of the index route: queue name to requested types
pub type StatusQuery = HashMap<String, Vec<String>>;

pub fn parse_query(query: Option<&str>) -> StatusQuery {
    let mut parsed = StatusQuery::new();
    if let Some(query) = query {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            parsed
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    parsed
}

/// Status filter requested for one queue
pub fn status_filter(values: Option<&Vec<String>>) -> StatusFilter {
    match values {
        None => StatusFilter::Default,
        Some(values) if values.len() == 1 && values[0] == LATEST => StatusFilter::all(),
        Some(values) => StatusFilter::Types(values.clone()),
    }
}

/// Job record flattened for the response
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobJson,
    pub delay: Option<u64>,
}

impl JobView {
    pub fn from_job(job: &dyn Job) -> Self {
        Self {
            job: job.to_json(),
            delay: job.opts().delay,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueSummary {
    pub name: String,
    pub counts: JobCounts,
    pub jobs: Vec<JobView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum IndexResponse {
    /// No queues are managed
    Empty {
        stats: StoreStats,
        queues: Vec<QueueSummary>,
    },
    Queues {
        stats: StoreStats,
        data: Vec<QueueSummary>,
    },
}

fn find_queue<'a>(ctx: &'a PanelContext, name: &str) -> Result<&'a Arc<dyn Queue>, PanelError> {
    ctx.queue(name).ok_or_else(|| {
        debug!(queue = %name, "Queue not found");
        PanelError::NotFound
    })
}

async fn find_job(ctx: &PanelContext, queue: &str, id: &str) -> Result<Box<dyn Job>, PanelError> {
    let queue = find_queue(ctx, queue)?;
    queue.get_job(id).await?.ok_or_else(|| {
        debug!(queue = %queue.name(), job = %id, "Job not found");
        PanelError::NotFound
    })
}

async fn summarize(queue: &dyn Queue, filter: StatusFilter) -> Result<QueueSummary, PanelError> {
    let (counts, jobs) = tokio::try_join!(
        queue.get_job_counts(&JobStatus::ALL),
        queue.get_jobs(&filter, JOB_PAGE_START, JOB_PAGE_END),
    )?;

    Ok(QueueSummary {
        name: queue.name().to_string(),
        counts,
        jobs: jobs.iter().map(|job| JobView::from_job(job.as_ref())).collect(),
    })
}

/// Store statistics plus counts and latest jobs of every queue
pub async fn index(ctx: &PanelContext, query: &StatusQuery) -> Result<IndexResponse, PanelError> {
    let Some(first) = ctx.queues().first() else {
        return Ok(IndexResponse::Empty {
            stats: StoreStats::new(),
            queues: Vec::new(),
        });
    };

    let client = first.client();
    let summaries = ctx
        .queues()
        .iter()
        .map(|queue| summarize(queue.as_ref(), status_filter(query.get(queue.name()))));

    let (stats, data) = tokio::try_join!(
        async { stats::collect_stats(client.as_ref()).await.map_err(PanelError::from) },
        future::try_join_all(summaries),
    )?;

    Ok(IndexResponse::Queues { stats, data })
}

/// Retry every failed job of a queue
pub async fn retry_all(ctx: &PanelContext, queue: &str) -> Result<u64, PanelError> {
    let queue = find_queue(ctx, queue)?;
    let retried = queue.retry_jobs().await?;
    info!(queue = %queue.name(), count = retried, "Retried all failed jobs");
    Ok(retried)
}

pub async fn retry(ctx: &PanelContext, queue: &str, job: &str) -> Result<(), PanelError> {
    let job = find_job(ctx, queue, job).await?;
    job.retry().await?;
    info!(queue = %queue, job = %job.id(), "Retried job");
    Ok(())
}

pub async fn promote(ctx: &PanelContext, queue: &str, job: &str) -> Result<(), PanelError> {
    let job = find_job(ctx, queue, job).await?;
    job.promote().await?;
    info!(queue = %queue, job = %job.id(), "Promoted job");
    Ok(())
}

/// Remove jobs in `status` older than [`CLEAN_GRACE`]
pub async fn clean(ctx: &PanelContext, queue: &str, status: &str) -> Result<Vec<String>, PanelError> {
    let queue = find_queue(ctx, queue)?;
    let removed = queue.clean(CLEAN_GRACE, status).await?;
    info!(queue = %queue.name(), status = %status, count = removed.len(), "Cleaned queue");
    Ok(removed)
}

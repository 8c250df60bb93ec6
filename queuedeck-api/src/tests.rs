//! Router-level tests for the panel routes

use super::*;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use parking_lot::Mutex;
use queuedeck_core::{
    Job, JobCounts, JobJson, JobOptions, JobStatus, MemoryQueue, Queue, QueueError, StaticStore,
    StatusFilter, StoreClient,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const INFO: &str = "# Server\r\nredis_version:7.2.4\r\nuptime_in_days:3\r\n# Clients\r\nconnected_clients:2\r\nblocked_clients:0\r\n# Memory\r\nused_memory:1000\r\nmaxmemory:4096\r\nmem_fragmentation_ratio:1.10\r\n";

// =============================================================================
// RECORDING QUEUE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Counts(Vec<JobStatus>),
    Jobs(StatusFilter, usize, usize),
    GetJob(String),
    RetryJobs,
    Clean(Duration, String),
    Retry(String),
    Promote(String),
}

type CallLog = Arc<Mutex<Vec<Call>>>;

struct RecordingQueue {
    name: String,
    job_ids: Vec<String>,
    calls: CallLog,
}

impl RecordingQueue {
    fn new(name: &str, job_ids: &[&str]) -> (Self, CallLog) {
        let calls = CallLog::default();
        let queue = Self {
            name: name.to_string(),
            job_ids: job_ids.iter().map(|s| s.to_string()).collect(),
            calls: calls.clone(),
        };
        (queue, calls)
    }
}

struct RecordingJob {
    json: JobJson,
    calls: CallLog,
}

fn job_json(id: &str) -> JobJson {
    JobJson {
        id: id.to_string(),
        name: "render".to_string(),
        data: json!({"page": id}),
        opts: JobOptions {
            delay: Some(250),
            ..Default::default()
        },
        progress: json!(40),
        timestamp: 1_700_000_000_000,
        processed_on: Some(1_700_000_000_100),
        finished_on: None,
        attempts_made: 1,
        failed_reason: Some("boom".to_string()),
        stacktrace: vec!["Error: boom".to_string()],
        returnvalue: Value::Null,
    }
}

#[async_trait]
impl Job for RecordingJob {
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
        self.calls.lock().push(Call::Retry(self.json.id.clone()));
        Ok(())
    }

    async fn promote(&self) -> Result<(), QueueError> {
        self.calls.lock().push(Call::Promote(self.json.id.clone()));
        Ok(())
    }
}

#[async_trait]
impl Queue for RecordingQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn client(&self) -> Arc<dyn StoreClient> {
        Arc::new(StaticStore::new(INFO))
    }

    async fn get_job_counts(&self, statuses: &[JobStatus]) -> Result<JobCounts, QueueError> {
        self.calls.lock().push(Call::Counts(statuses.to_vec()));
        Ok(statuses.iter().map(|s| (*s, 0)).collect())
    }

    async fn get_jobs(
        &self,
        filter: &StatusFilter,
        start: usize,
        end: usize,
    ) -> Result<Vec<Box<dyn Job>>, QueueError> {
        self.calls.lock().push(Call::Jobs(filter.clone(), start, end));
        Ok(self
            .job_ids
            .iter()
            .map(|id| {
                Box::new(RecordingJob {
                    json: job_json(id),
                    calls: self.calls.clone(),
                }) as Box<dyn Job>
            })
            .collect())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Box<dyn Job>>, QueueError> {
        self.calls.lock().push(Call::GetJob(id.to_string()));
        Ok(self.job_ids.iter().find(|j| *j == id).map(|id| {
            Box::new(RecordingJob {
                json: job_json(id),
                calls: self.calls.clone(),
            }) as Box<dyn Job>
        }))
    }

    async fn retry_jobs(&self) -> Result<u64, QueueError> {
        self.calls.lock().push(Call::RetryJobs);
        Ok(0)
    }

    async fn clean(&self, grace: Duration, status: &str) -> Result<Vec<String>, QueueError> {
        self.calls.lock().push(Call::Clean(grace, status.to_string()));
        Ok(Vec::new())
    }
}

/// Queue whose every operation fails
struct BrokenQueue;

#[async_trait]
impl Queue for BrokenQueue {
    fn name(&self) -> &str {
        "broken"
    }

    fn client(&self) -> Arc<dyn StoreClient> {
        Arc::new(StaticStore::new(INFO))
    }

    async fn get_job_counts(&self, _statuses: &[JobStatus]) -> Result<JobCounts, QueueError> {
        Err(QueueError::Backend("connection refused".into()))
    }

    async fn get_jobs(
        &self,
        _filter: &StatusFilter,
        _start: usize,
        _end: usize,
    ) -> Result<Vec<Box<dyn Job>>, QueueError> {
        Ok(Vec::new())
    }

    async fn get_job(&self, _id: &str) -> Result<Option<Box<dyn Job>>, QueueError> {
        Err(QueueError::Backend("connection refused".into()))
    }

    async fn retry_jobs(&self) -> Result<u64, QueueError> {
        Err(QueueError::Backend("connection refused".into()))
    }

    async fn clean(&self, _grace: Duration, _status: &str) -> Result<Vec<String>, QueueError> {
        Err(QueueError::Backend("connection refused".into()))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn app(queues: QueueList) -> Router {
    app_with(PanelOptions {
        queues: QueueSource::Static(queues),
        ..Default::default()
    })
    .await
}

async fn app_with(options: PanelOptions) -> Router {
    register(Router::new(), options).await.unwrap()
}

async fn send(app: &Router, method: &str, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn not_found_body() -> Value {
    json!({"statusCode": 404, "error": "Not Found", "message": "Not Found"})
}

// =============================================================================
// INDEX
// =============================================================================

mod index_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_queue_list() {
        let app = app(Vec::new()).await;
        let response = send(&app, "GET", "/queues").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"stats": {}, "queues": []}));
    }

    #[tokio::test]
    async fn test_stats_and_queue_data() {
        let (emails, _) = RecordingQueue::new("emails", &["1", "2"]);
        let (reports, _) = RecordingQueue::new("reports", &[]);
        let app = app(vec![Arc::new(emails), Arc::new(reports)]).await;

        let response = send(&app, "GET", "/queues").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(
            body["stats"],
            json!({
                "redis_version": "7.2.4",
                "used_memory": "1000",
                "mem_fragmentation_ratio": "1.10",
                "connected_clients": "2",
                "blocked_clients": "0",
                "total_system_memory": "4096",
            })
        );

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "emails");
        assert_eq!(data[1]["name"], "reports");
        assert_eq!(
            data[0]["counts"],
            json!({"active": 0, "completed": 0, "delayed": 0, "failed": 0, "paused": 0, "waiting": 0})
        );

        let job = &data[0]["jobs"][0];
        assert_eq!(job["id"], "1");
        assert_eq!(job["delay"], 250);
        assert_eq!(job["attemptsMade"], 1);
        assert_eq!(job["failedReason"], "boom");
        assert_eq!(job["processedOn"], 1_700_000_000_100_i64);
        assert_eq!(job["finishedOn"], Value::Null);
        assert_eq!(job["data"], json!({"page": "1"}));
    }

    #[tokio::test]
    async fn test_counts_and_window_requested() {
        let (queue, calls) = RecordingQueue::new("emails", &[]);
        let app = app(vec![Arc::new(queue)]).await;

        send(&app, "GET", "/queues").await;

        let calls = calls.lock().clone();
        assert!(calls.contains(&Call::Counts(JobStatus::ALL.to_vec())));
        assert!(calls.contains(&Call::Jobs(StatusFilter::Default, 0, 10)));
    }

    #[tokio::test]
    async fn test_latest_expands_to_all_statuses() {
        let (emails, email_calls) = RecordingQueue::new("emails", &[]);
        let (reports, report_calls) = RecordingQueue::new("reports", &[]);
        let app = app(vec![Arc::new(emails), Arc::new(reports)]).await;

        send(&app, "GET", "/queues?emails=latest&reports=failed").await;

        assert!(email_calls
            .lock()
            .contains(&Call::Jobs(StatusFilter::all(), 0, 10)));
        assert!(report_calls.lock().contains(&Call::Jobs(
            StatusFilter::Types(vec!["failed".into()]),
            0,
            10
        )));
    }

    #[tokio::test]
    async fn test_other_values_pass_verbatim() {
        let (queue, calls) = RecordingQueue::new("emails", &[]);
        let app = app(vec![Arc::new(queue)]).await;

        send(&app, "GET", "/queues?emails=failed%2Cwaiting&emails=active").await;

        assert!(calls.lock().contains(&Call::Jobs(
            StatusFilter::Types(vec!["failed,waiting".into(), "active".into()]),
            0,
            10
        )));
    }

    #[tokio::test]
    async fn test_queue_failure_fails_request() {
        let (healthy, _) = RecordingQueue::new("emails", &[]);
        let app = app(vec![Arc::new(healthy), Arc::new(BrokenQueue)]).await;

        let response = send(&app, "GET", "/queues").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["statusCode"], 500);
    }

    #[tokio::test]
    async fn test_memory_queue_listing_capped() {
        let queue = MemoryQueue::with_static_store("bulk");
        for i in 0..25 {
            queue.add("task", json!({"n": i}), JobOptions::default());
        }
        let app = app(vec![Arc::new(queue)]).await;

        let body = body_json(send(&app, "GET", "/queues").await).await;
        assert_eq!(body["data"][0]["jobs"].as_array().unwrap().len(), 10);
        assert_eq!(body["data"][0]["counts"]["waiting"], 25);
    }
}

// =============================================================================
// JOB MUTATIONS
// =============================================================================

mod job_tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_unknown_queue() {
        let (queue, calls) = RecordingQueue::new("emails", &["1"]);
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", "/queues/missing/jobs/1/retry").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, not_found_body());
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_retry_unknown_job() {
        let (queue, calls) = RecordingQueue::new("emails", &["1"]);
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", "/queues/emails/jobs/99/retry").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, not_found_body());
        assert_eq!(calls.lock().clone(), vec![Call::GetJob("99".into())]);
    }

    #[tokio::test]
    async fn test_retry_job() {
        let (queue, calls) = RecordingQueue::new("emails", &["1", "2"]);
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", "/queues/emails/jobs/2/retry").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_bytes(response).await.is_empty());

        let retries: Vec<Call> = calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Retry(_)))
            .cloned()
            .collect();
        assert_eq!(retries, vec![Call::Retry("2".into())]);
    }

    #[tokio::test]
    async fn test_promote_job() {
        let (queue, calls) = RecordingQueue::new("emails", &["7"]);
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", "/queues/emails/jobs/7/promote").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(calls.lock().contains(&Call::Promote("7".into())));
    }

    #[tokio::test]
    async fn test_promote_unknown_queue() {
        let app = app(Vec::new()).await;
        let response = send(&app, "PUT", "/queues/emails/jobs/7/promote").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, not_found_body());
    }

    #[tokio::test]
    async fn test_promote_unknown_job() {
        let (queue, calls) = RecordingQueue::new("emails", &["7"]);
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", "/queues/emails/jobs/99/promote").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, not_found_body());
        assert_eq!(calls.lock().clone(), vec![Call::GetJob("99".into())]);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_server_error() {
        let queue = MemoryQueue::with_static_store("emails");
        let id = queue.add("send", json!({}), JobOptions::default());
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", &format!("/queues/emails/jobs/{}/promote", id)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// QUEUE MUTATIONS
// =============================================================================

mod queue_tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_uses_fixed_grace() {
        let (queue, calls) = RecordingQueue::new("emails", &[]);
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", "/queues/emails/clean/completed").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(
            calls.lock().clone(),
            vec![Call::Clean(Duration::from_millis(5000), "completed".into())]
        );
    }

    #[tokio::test]
    async fn test_clean_unknown_queue() {
        let app = app(Vec::new()).await;
        let response = send(&app, "PUT", "/queues/emails/clean/failed").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, not_found_body());
    }

    #[tokio::test]
    async fn test_retry_all() {
        let (queue, calls) = RecordingQueue::new("emails", &[]);
        let app = app(vec![Arc::new(queue)]).await;

        let response = send(&app, "PUT", "/queues/emails/retry").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(calls.lock().clone(), vec![Call::RetryJobs]);
    }

    #[tokio::test]
    async fn test_retry_all_unknown_queue() {
        let app = app(Vec::new()).await;
        let response = send(&app, "PUT", "/queues/emails/retry").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, not_found_body());
    }

    #[tokio::test]
    async fn test_clean_failure_propagates() {
        let app = app(vec![Arc::new(BrokenQueue)]).await;
        let response = send(&app, "PUT", "/queues/broken/clean/failed").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// REGISTRATION AND ROUTE OPTIONS
// =============================================================================

mod registration_tests {
    use super::*;

    #[tokio::test]
    async fn test_base_path_prefix() {
        let app = app_with(PanelOptions {
            base_path: "/admin/".into(),
            ..Default::default()
        })
        .await;

        assert_eq!(send(&app, "GET", "/admin/queues").await.status(), StatusCode::OK);
        assert_eq!(send(&app, "GET", "/queues").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routes_merge_into_host_router() {
        let host = Router::new().route("/health", axum::routing::get(|| async { "ok" }));
        let app = register(host, PanelOptions::default()).await.unwrap();

        assert_eq!(send(&app, "GET", "/health").await.status(), StatusCode::OK);
        assert_eq!(send(&app, "GET", "/queues").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_method_rejected() {
        let app = app(Vec::new()).await;
        let response = send(&app, "GET", "/queues/emails/retry").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_factory_queues() {
        let app = app_with(PanelOptions {
            queues: QueueSource::factory(|| async {
                let queues: QueueList = vec![Arc::new(MemoryQueue::with_static_store("built"))];
                Ok(queues)
            }),
            ..Default::default()
        })
        .await;

        let body = body_json(send(&app, "GET", "/queues").await).await;
        assert_eq!(body["data"][0]["name"], "built");
    }

    #[tokio::test]
    async fn test_factory_failure_aborts_registration() {
        let result = register(
            Router::<()>::new(),
            PanelOptions {
                queues: QueueSource::factory(|| async {
                    Err(QueueError::Backend("no store".into()))
                }),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(PanelError::Queue(_))));
    }

    #[tokio::test]
    async fn test_auth_required() {
        let (queue, calls) = RecordingQueue::new("emails", &["1"]);
        let app = app_with(PanelOptions {
            queues: QueueSource::Static(vec![Arc::new(queue)]),
            route_options: RouteOptions {
                auth: Some(AuthStrategy::Bearer {
                    token: "s3cret".into(),
                }),
                cors: false,
            },
            ..Default::default()
        })
        .await;

        let response = send(&app, "PUT", "/queues/emails/jobs/1/retry").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "Missing authentication");
        assert!(calls.lock().is_empty());

        let request = Request::builder()
            .method("PUT")
            .uri("/queues/emails/jobs/1/retry")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "Bad credentials");
        assert!(calls.lock().is_empty());

        let request = Request::builder()
            .method("PUT")
            .uri("/queues/emails/jobs/1/retry")
            .header(header::AUTHORIZATION, "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let app = app_with(PanelOptions {
            route_options: RouteOptions {
                auth: None,
                cors: true,
            },
            ..Default::default()
        })
        .await;

        let request = Request::builder()
            .method("GET")
            .uri("/queues")
            .header(header::ORIGIN, "http://dashboard.local")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}

//! Route registration

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::context::PanelContext;
use crate::controller::{self, IndexResponse};
use crate::error::PanelError;
use crate::options::{PanelOptions, RouteOptions};

/// Resolve the managed queues and merge the panel routes into `router`
///
/// A queue factory is awaited here, exactly once; the resulting list is shared
/// read-only by every handler.
pub async fn register<S>(router: Router<S>, options: PanelOptions) -> Result<Router<S>, PanelError>
where
    S: Clone + Send + Sync + 'static,
{
    let PanelOptions {
        base_path,
        queues,
        route_options,
    } = options;

    let ctx = Arc::new(PanelContext::resolve(queues).await?);
    let base_path = normalize_base_path(&base_path);
    info!(
        base_path = %base_path,
        queues = ctx.queues().len(),
        "Registering queue panel routes"
    );

    Ok(router.merge(panel_router(&base_path, ctx, &route_options)))
}

/// Build the five panel routes under `base_path`
pub fn panel_router<S>(
    base_path: &str,
    ctx: Arc<PanelContext>,
    route_options: &RouteOptions,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let base = normalize_base_path(base_path);
    let routes = Router::new()
        .route(&format!("{base}/queues"), get(index))
        .route(&format!("{base}/queues/:queue/retry"), put(retry_all))
        .route(&format!("{base}/queues/:queue/clean/:status"), put(clean))
        .route(&format!("{base}/queues/:queue/jobs/:job/retry"), put(retry))
        .route(&format!("{base}/queues/:queue/jobs/:job/promote"), put(promote));

    route_options.apply(routes).with_state(ctx)
}

/// `"admin/"` becomes `"/admin"`; empty and `"/"` become `""`
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

async fn index(
    State(ctx): State<Arc<PanelContext>>,
    RawQuery(query): RawQuery,
) -> Result<Json<IndexResponse>, PanelError> {
    let query = controller::parse_query(query.as_deref());
    Ok(Json(controller::index(&ctx, &query).await?))
}

async fn retry_all(
    State(ctx): State<Arc<PanelContext>>,
    Path(queue): Path<String>,
) -> Result<StatusCode, PanelError> {
    controller::retry_all(&ctx, &queue).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clean(
    State(ctx): State<Arc<PanelContext>>,
    Path((queue, status)): Path<(String, String)>,
) -> Result<StatusCode, PanelError> {
    controller::clean(&ctx, &queue, &status).await?;
    Ok(StatusCode::OK)
}

async fn retry(
    State(ctx): State<Arc<PanelContext>>,
    Path((queue, job)): Path<(String, String)>,
) -> Result<StatusCode, PanelError> {
    controller::retry(&ctx, &queue, &job).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn promote(
    State(ctx): State<Arc<PanelContext>>,
    Path((queue, job)): Path<(String, String)>,
) -> Result<StatusCode, PanelError> {
    controller::promote(&ctx, &queue, &job).await?;
    Ok(StatusCode::NO_CONTENT)
}

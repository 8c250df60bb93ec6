//! HTTP router for the QueueDeck host server

use axum::{response::IntoResponse, routing::get, Json, Router};
use queuedeck_api::{PanelError, PanelOptions};
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Create the host router with the queue panel mounted
pub async fn create_router(options: PanelOptions) -> Result<Router, PanelError> {
    let host = Router::new().route("/health", get(health_check));

    let app = queuedeck_api::register(host, options).await?;
    Ok(app.layer(TraceLayer::new_for_http()))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "running"}))
}

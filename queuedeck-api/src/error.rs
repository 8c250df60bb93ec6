//! Panel errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use queuedeck_core::{ErrorBody, QueueError, StoreError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PanelError {
    /// Named queue or job is not in the resolved set
    #[error("Not Found")]
    NotFound,

    #[error("Missing authentication")]
    Unauthorized,

    #[error("Bad credentials")]
    BadCredentials,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PanelError {
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::NotFound => ErrorBody::not_found(),
            Self::Unauthorized => ErrorBody::unauthorized(),
            Self::BadCredentials => ErrorBody::bad_credentials(),
            Self::Queue(_) | Self::Store(_) => ErrorBody::internal(),
        }
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Queue(_) | Self::Store(_)) {
            error!(error = %self, "Queue panel request failed");
        }

        let body = self.body();
        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

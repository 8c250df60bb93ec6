//! Error types and the HTTP error body

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP error kinds surfaced by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Unauthorized,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "Not Found",
            Self::Unauthorized => "Unauthorized",
            Self::InternalServerError => "Internal Server Error",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Unauthorized => 401,
            Self::InternalServerError => 500,
        }
    }
}

/// Standard JSON error body: `{statusCode, error, message}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.http_status(),
            error: code.as_str().to_string(),
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, ErrorCode::NotFound.as_str())
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Missing authentication")
    }

    /// Credentials were sent but did not match
    pub fn bad_credentials() -> Self {
        Self::new(ErrorCode::Unauthorized, "Bad credentials")
    }

    /// Generic body for failures that are not reported to the caller
    pub fn internal() -> Self {
        Self::new(
            ErrorCode::InternalServerError,
            "An internal server error occurred",
        )
    }
}

/// Errors raised by a queue backend
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid job status: {0}")]
    InvalidStatus(String),

    #[error("Job {id} cannot be changed: {reason}")]
    InvalidState { id: String, reason: String },

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Queue backend error: {0}")]
    Backend(String),
}

/// Errors raised by the backing store client
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store command error: {0}")]
    Command(String),
}

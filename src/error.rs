//! Error taxonomy shared by the stores, orchestrator, and HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors surfaced by the service core.
///
/// Validation and lookup errors are returned synchronously to the caller.
/// Generation-task failures are never propagated to the original submitter;
/// they land on the report as its terminal `failed` status instead.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-enumeration input. Not retryable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown or deleted identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// Chat or download requested before generation has completed.
    #[error("not ready: {0}")]
    NotReady(String),

    /// Disallowed field mutation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Workspace read/write failure.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// External generation procedure error on a synchronous path
    /// (ad-hoc chat, synchronous submit plumbing).
    #[error("generation failed: {0}")]
    Generation(String),

    /// Report/chat store persistence failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotReady(_) => StatusCode::CONFLICT,
            ApiError::Io(_) | ApiError::Generation(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!("request failed: {}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

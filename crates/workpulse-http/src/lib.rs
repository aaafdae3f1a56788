//! HTTP status ingress for workpulsed
//!
//! Provides:
//! - `GET /status?cursor_status=...` to feed status text into the work timer
//! - `GET /health` liveness report
//! - `GET /stats/today`, `GET /network` and `GET /ports` read-only views
//! - Permissive CORS headers on every response

mod backend;
mod server;

pub use backend::*;
pub use server::*;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;
use workpulse_api::{ErrorBody, INTERNAL_ERROR_MESSAGE, MISSING_STATUS_MESSAGE};

/// Errors surfaced to HTTP callers
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("Missing cursor_status parameter")]
    MissingParameter,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type IngressResult<T> = Result<T, IngressError>;

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IngressError::MissingParameter => (StatusCode::BAD_REQUEST, MISSING_STATUS_MESSAGE),
            IngressError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

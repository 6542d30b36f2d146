//! Error responses for the HTTP gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::lock::LockError;

/// Everything a gateway handler can answer other than success.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request body missing, not JSON, or out of bounds.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Lock is not (or no longer) the holder of its resource.
    #[error("not found: {0}")]
    NotFound(String),
    /// Acquire gave up waiting.
    #[error("timed out waiting for resource {0}")]
    Timeout(String),
    /// Delete refused because locks are still held.
    #[error("conflict: {message}")]
    Conflict { message: String, held: Vec<String> },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::BadRequest(_) => 400,
            GatewayError::NotFound(_) => 404,
            GatewayError::Timeout(_) => 408,
            GatewayError::Conflict { .. } => 409,
            GatewayError::Lock(LockError::InvalidRequest(_)) => 400,
            GatewayError::Lock(LockError::Poisoned(_)) => 500,
            GatewayError::Internal(_) => 500,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            GatewayError::Conflict { held, .. } => {
                json!({ "error": self.to_string(), "held": held })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

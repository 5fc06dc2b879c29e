//! Unified error handling for the web endpoints.
//!
//! Handler-level failures are caught here and turned into generic response
//! bodies; detail goes to the server log only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Webhook shared-secret mismatch
    #[error("unauthorized")]
    Unauthorized,

    /// JSON serialization error
    #[error("Invalid JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Any other uncaught handler failure
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::JsonSerialize(e) => {
                tracing::error!("JSON serialize error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        let body = Json(json!({"status": "error", "message": message}));
        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

//! Shared-secret middleware for the webhook-facing routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

pub const WEBHOOK_TOKEN_HEADER: &str = "X-Webhook-Token";

/// Middleware that checks the `X-Webhook-Token` header against the configured
/// secret. Used with `axum::middleware::from_fn_with_state` on the protected
/// routes. When no secret is configured the check is skipped.
pub async fn require_webhook_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(secret) = &state.config.webhook_secret {
        let presented = request
            .headers()
            .get(WEBHOOK_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        if presented != secret {
            tracing::warn!("Rejected request with bad webhook token");
            return ApiError::Unauthorized.into_response();
        }
    }

    next.run(request).await
}

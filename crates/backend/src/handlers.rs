//! HTTP handlers: thin dispatch over the monitor passes.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::AppState;

/// Chat-bot webhook. Runs the monitor pass only when the message text equals
/// `TEST` (case-insensitive); anything else is acknowledged and ignored.
pub async fn webhook_cliq(
    State(state): State<AppState>,
    payload: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let payload = payload.map(|Json(value)| value).unwrap_or(Value::Null);
    let message = extract_message_text(&payload);

    if message.trim().eq_ignore_ascii_case("TEST") {
        let summary = state.monitor.monitor_pass().await;
        return Ok(Json(json!({"status": "ok", "summary": summary})));
    }

    Ok(Json(json!({"status": "ignored"})))
}

pub async fn run_monitor(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.monitor.monitor_pass().await;
    Ok(Json(json!({"status": "ok", "result": result})))
}

pub async fn run_digest(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.monitor.daily_digest().await;
    Ok(Json(json!({"status": "ok", "result": result})))
}

/// Unauthenticated monitor trigger for debugging deployments.
pub async fn debug_tasks(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let summary = state.monitor.monitor_pass().await;
    Ok(Json(json!({"status": "ok", "summary": summary})))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "message": "healthy"}))
}

/// Deployment marker so a live instance can be told apart from a stale one.
pub async fn deploy_marker() -> Json<Value> {
    Json(json!({"status": "ok", "message": "DEPLOYED VERSION"}))
}

/// Pull the message text out of a webhook payload. The text may live under
/// `text`, `content`, or `message`, each either a string or an object with a
/// `content`/`text` field.
fn extract_message_text(payload: &Value) -> String {
    let field = ["text", "content", "message"]
        .iter()
        .find_map(|key| {
            payload
                .get(*key)
                .filter(|v| !v.is_null() && v.as_str() != Some(""))
        });

    match field {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => map
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| map.get("text").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

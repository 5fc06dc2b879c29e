//! Projects Risk Monitor backend.
//!
//! Polls the Zoho Projects task list for one project, classifies tasks as
//! overdue or due-soon, and alerts owners over Zoho Cliq. Triggered over HTTP
//! (webhook, manual, or an external cron hitting `/digest`).

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod monitor;
pub mod zoho;

use config::Config;
use monitor::RiskMonitor;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub monitor: Arc<RiskMonitor>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let monitor = Arc::new(RiskMonitor::new(&config));
        AppState {
            config: Arc::new(config),
            monitor,
        }
    }
}

/// Build the application router. Webhook-facing routes sit behind the
/// shared-secret middleware; health and debug routes do not.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/cliq", post(handlers::webhook_cliq))
        .route("/digest", post(handlers::run_digest))
        .route("/monitor", post(handlers::run_monitor))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_webhook_token,
        ))
        .route("/debug/tasks", get(handlers::debug_tasks))
        .route("/health", get(handlers::health))
        .route("/__debug", get(handlers::deploy_marker))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod admission;
pub mod config;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod rate_limit;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{chat_handler, health_handler, metrics_handler};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ai", post(chat_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::extract::State;
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::metrics::TRACKED_USERS;
use crate::state::AppState;

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, GatewayError> {
    TRACKED_USERS.set(state.admission.ledger().tracked_users() as f64);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| GatewayError::Internal(e.to_string()))
}

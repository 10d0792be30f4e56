use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;

use crate::error::GatewayError;
use crate::metrics::{DENIED_TOTAL, UPSTREAM_LATENCY, REQUEST_TOTAL, UPSTREAM_FAILURES};
use crate::models::{ChatRequest, ChatResponse};
use crate::state::AppState;

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, GatewayError> {
    REQUEST_TOTAL.inc();
    payload.validate()?;

    // Admission is fully synchronous, the ledger lock is released before
    // the model call starts
    if let Err(denial) = state.admission.admit(&payload.username) {
        DENIED_TOTAL.with_label_values(&[denial.reason()]).inc();
        tracing::info!(username = %payload.username, reason = denial.reason(), "request denied");
        return Err(denial.into());
    }

    let start_time = Instant::now();
    let result = state.generator.generate(&payload.message).await;
    UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

    match result {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(e) => {
            UPSTREAM_FAILURES.inc();
            tracing::error!(username = %payload.username, error = %e, "AI service call failed");
            Err(e.into())
        }
    }
}

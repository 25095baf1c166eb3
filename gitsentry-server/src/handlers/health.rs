//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use metrics::gauge;
use serde_json::{Value, json};

use gitsentry_core::metrics::SERVER_UPTIME_SECONDS;

use super::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let uptime_secs = state.started_at.elapsed().as_secs();
    gauge!(SERVER_UPTIME_SECONDS).set(uptime_secs as f64);
    Json(json!({ "status": "ok", "uptime_secs": uptime_secs }))
}

//! Webhook intake.
//!
//! The raw body must be verified byte-for-byte before anything is parsed
//! from it, so these handlers take `Bytes`, never an extracted JSON
//! body. The tokenized route resolves its binding from the URL alone;
//! the bare route verifies against the process-wide secret and matches a
//! binding only afterwards.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::counter;
use serde_json::json;
use tracing::info;

use gitsentry_core::error::{AuthError, GitsentryError};
use gitsentry_core::metrics::{LABEL_OUTCOME, WEBHOOK_DELIVERIES_TOTAL};
use gitsentry_core::signature::verify_signature;

use super::{ApiError, AppState};
use crate::coordinator;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const EVENT_HEADER: &str = "x-github-event";

pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    handle_delivery(state, None, headers, body).await
}

pub async fn receive_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    handle_delivery(state, Some(token), headers, body).await
}

async fn handle_delivery(
    state: AppState,
    token: Option<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let delivery_id = uuid::Uuid::new_v4();
    info!(%delivery_id, bytes = body.len(), "webhook delivery received");

    let binding = match token.as_deref() {
        Some(token) => Some(state.registry.by_token(token).ok_or_else(|| {
            record_outcome("rejected");
            GitsentryError::NotFound("Unknown webhook token".to_owned())
        })?),
        None => None,
    };

    let secret = state.registry.secret_for(binding).ok_or_else(|| {
        record_outcome("rejected");
        GitsentryError::Auth(AuthError::InvalidSignature)
    })?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if !verify_signature(&body, signature, secret) {
        record_outcome("rejected");
        return Err(GitsentryError::Auth(AuthError::InvalidSignature).into());
    }

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if event != "push" {
        record_outcome("ignored");
        info!(event, "ignoring non-push event");
        return Ok((StatusCode::OK, Json(json!({ "message": "Event ignored" }))).into_response());
    }

    let target = coordinator::resolve_target(&body).inspect_err(|_| {
        record_outcome("rejected");
    })?;

    let owner_id = match binding {
        Some(binding) => Some(binding.user_id.clone()),
        None => state
            .registry
            .by_repo(&target.owner, &target.repo_name)
            .map(|b| b.user_id.clone()),
    };

    state.coordinator.process_push(owner_id, target).await?;
    record_outcome("processed");
    Ok((StatusCode::OK, Json(json!({ "message": "Event processed" }))).into_response())
}

fn record_outcome(outcome: &'static str) {
    counter!(WEBHOOK_DELIVERIES_TOTAL, LABEL_OUTCOME => outcome).increment(1);
}

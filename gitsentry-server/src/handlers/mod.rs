//! HTTP surface -- routing, shared state, and error mapping.
//!
//! Routes:
//! - `POST /api/github/webhook` and `POST /api/github/webhook/{token}` --
//!   webhook intake
//! - `GET /api/reports/{owner}/{repo}` -- report listing
//! - `GET /api/reports/{owner}/{repo}/{commit_id}` -- one report
//! - `POST /api/reports/{owner}/{repo}/{commit_id}/download-pdf` -- PDF
//! - `GET /health` -- liveness
//!
//! Error mapping: auth failures are 401, payload validation failures are
//! 400, unknown resources are 404, everything else is a 500 carrying
//! only a failure category; specifics stay in the log.

pub mod health;
pub mod reports;
pub mod webhook;

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::json;
use tracing::error;

use gitsentry_core::config::GitsentryConfig;
use gitsentry_core::error::GitsentryError;
use gitsentry_report_store::ReportStore;

use crate::coordinator::ScanCoordinator;
use crate::registry::RepoRegistry;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RepoRegistry>,
    pub coordinator: Arc<ScanCoordinator>,
    pub store: Arc<ReportStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn from_config(config: &GitsentryConfig) -> Self {
        let store = Arc::new(ReportStore::new(&config.store.data_dir));
        Self {
            registry: Arc::new(RepoRegistry::from_config(&config.server)),
            coordinator: Arc::new(ScanCoordinator::from_config(config, Arc::clone(&store))),
            store,
            started_at: Instant::now(),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/github/webhook", post(webhook::receive))
        .route("/api/github/webhook/{token}", post(webhook::receive_with_token))
        .route("/api/reports/{owner}/{repo}", get(reports::list_reports))
        .route("/api/reports/{owner}/{repo}/{commit_id}", get(reports::get_report))
        .route(
            "/api/reports/{owner}/{repo}/{commit_id}/download-pdf",
            post(reports::download_pdf),
        )
        .with_state(state)
}

/// Response-side wrapper for [`GitsentryError`].
pub struct ApiError(pub GitsentryError);

impl<E: Into<GitsentryError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            GitsentryError::Auth(_) => {
                (StatusCode::UNAUTHORIZED, "Invalid signature".to_owned())
            }
            GitsentryError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            GitsentryError::NotFound(what) => (StatusCode::NOT_FOUND, what.clone()),
            other => {
                error!(error = %other, "request failed");
                // Only the failure category goes out; paths and command
                // lines stay in the log.
                let details = match other {
                    GitsentryError::Store(_) => "report persistence failed",
                    GitsentryError::Render(_) => "document rendering failed",
                    GitsentryError::Scanner(_) => "scan execution failed",
                    _ => "unexpected failure",
                };
                let body = json!({ "error": "Internal server error", "details": details });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

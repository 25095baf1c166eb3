//! Report retrieval and PDF download.
//!
//! URL parameters carry `(owner, repo, commit)`; the owning user id is
//! recovered from the registry the same way webhook intake resolves it,
//! so reads land on the same key writes used.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use metrics::{counter, histogram};
use serde_json::json;

use gitsentry_core::error::{GitsentryError, RenderError};
use gitsentry_core::metrics::{
    DOCUMENTS_RENDERED_TOTAL, LABEL_RESULT, RENDER_DURATION_SECONDS,
};
use gitsentry_core::report::ReportKey;
use gitsentry_doc_renderer::render_report;

use super::{ApiError, AppState};

pub async fn get_report(
    State(state): State<AppState>,
    Path((owner, repo, commit_id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let key = report_key(&state, owner, repo, commit_id);
    match state.store.get(&key).await? {
        Some(report) => Ok(Json(json!({ "report": report })).into_response()),
        None => Err(GitsentryError::NotFound("Report not found".to_owned()).into()),
    }
}

pub async fn list_reports(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let owner_id = state
        .registry
        .by_repo(&owner, &repo)
        .map(|b| b.user_id.clone());
    let reports = state.store.list(owner_id.as_deref(), &owner, &repo).await?;
    Ok(Json(json!({ "reports": reports })).into_response())
}

pub async fn download_pdf(
    State(state): State<AppState>,
    Path((owner, repo, commit_id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let key = report_key(&state, owner.clone(), repo.clone(), commit_id.clone());
    let report = state
        .store
        .get(&key)
        .await?
        .ok_or_else(|| GitsentryError::NotFound("Report not found".to_owned()))?;

    // PDF assembly is CPU-bound; keep it off the async workers.
    let started = Instant::now();
    let rendered = tokio::task::spawn_blocking(move || render_report(&report))
        .await
        .map_err(|e| {
            GitsentryError::Render(RenderError::Pdf {
                reason: format!("render task failed: {e}"),
            })
        })?;
    histogram!(RENDER_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    let bytes = match rendered {
        Ok(bytes) => {
            counter!(DOCUMENTS_RENDERED_TOTAL, LABEL_RESULT => "success").increment(1);
            bytes
        }
        Err(e) => {
            counter!(DOCUMENTS_RENDERED_TOTAL, LABEL_RESULT => "failure").increment(1);
            return Err(e.into());
        }
    };

    let short_commit: String = commit_id.chars().take(7).collect();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"report_{owner}_{repo}_{short_commit}.pdf\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn report_key(state: &AppState, owner: String, repo_name: String, commit_id: String) -> ReportKey {
    let owner_id = state
        .registry
        .by_repo(&owner, &repo_name)
        .map(|b| b.user_id.clone());
    ReportKey {
        owner_id,
        owner,
        repo_name,
        commit_id,
    }
}

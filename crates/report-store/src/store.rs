//! Report store implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use gitsentry_core::error::{GitsentryError, StoreError};
use gitsentry_core::report::{AggregateReport, ReportKey, ReportSummary};

/// Directory name for unmatched deliveries (no registered binding).
const ANONYMOUS_OWNER: &str = "anonymous";

/// Filesystem-backed report store rooted at `{data_dir}/reports`.
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    /// Create a store rooted under `data_dir`. No I/O happens here;
    /// directories are created lazily on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into().join("reports"),
        }
    }

    /// Insert or replace the report for its key.
    pub async fn upsert(&self, report: &AggregateReport) -> Result<(), GitsentryError> {
        let key = report.key();
        let dir = self.repo_dir(key.owner_id.as_deref(), &key.owner, &key.repo_name)?;
        let path = dir.join(format!("{}.json", sanitized(&key.commit_id)?));

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| write_failed(&dir, &e))?;

        let body = serde_json::to_vec_pretty(report).map_err(|e| {
            GitsentryError::Store(StoreError::Serialize {
                reason: e.to_string(),
            })
        })?;

        // Temp file lives in the target directory so the rename stays on
        // one filesystem and is atomic.
        let tmp = dir.join(format!(".{}.json.tmp", key.commit_id));
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| write_failed(&tmp, &e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| write_failed(&path, &e))?;

        debug!(key = %key, bytes = body.len(), "report stored");
        Ok(())
    }

    /// Fetch the report for `key`, or `None` when no report exists.
    pub async fn get(&self, key: &ReportKey) -> Result<Option<AggregateReport>, GitsentryError> {
        let path = self.report_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_failed(&path, &e)),
        };
        let report = serde_json::from_slice(&bytes).map_err(|e| {
            GitsentryError::Store(StoreError::ReadFailed {
                reason: format!("corrupt report document: {e}"),
            })
        })?;
        Ok(Some(report))
    }

    /// List report summaries for one repository, newest first. An
    /// unknown repository yields an empty list, not an error.
    pub async fn list(
        &self,
        owner_id: Option<&str>,
        owner: &str,
        repo_name: &str,
    ) -> Result<Vec<ReportSummary>, GitsentryError> {
        let dir = self.repo_dir(owner_id, owner, repo_name)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_failed(&dir, &e)),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| read_failed(&dir, &e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => return Err(read_failed(&path, &e)),
            };
            match serde_json::from_slice::<AggregateReport>(&bytes) {
                Ok(report) => summaries.push(ReportSummary {
                    commit_id: report.commit_id,
                    created_at: report.generated_at,
                }),
                // One corrupt document must not hide the rest of the
                // listing.
                Err(e) => warn!(path = %path.display(), error = %e, "skipping corrupt report"),
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    fn report_path(&self, key: &ReportKey) -> Result<PathBuf, GitsentryError> {
        let dir = self.repo_dir(key.owner_id.as_deref(), &key.owner, &key.repo_name)?;
        Ok(dir.join(format!("{}.json", sanitized(&key.commit_id)?)))
    }

    fn repo_dir(
        &self,
        owner_id: Option<&str>,
        owner: &str,
        repo_name: &str,
    ) -> Result<PathBuf, GitsentryError> {
        Ok(self
            .root
            .join(sanitized(owner_id.unwrap_or(ANONYMOUS_OWNER))?)
            .join(sanitized(owner)?)
            .join(sanitized(repo_name)?))
    }
}

/// Validate one key component for use as a path segment. Components come
/// from webhook payloads and URL parameters, so traversal attempts are
/// expected input.
fn sanitized(component: &str) -> Result<&str, GitsentryError> {
    let invalid = component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\'])
        || component.contains('\0');
    if invalid {
        return Err(GitsentryError::Store(StoreError::InvalidKey {
            component: component.to_owned(),
        }));
    }
    Ok(component)
}

fn write_failed(path: &Path, err: &std::io::Error) -> GitsentryError {
    GitsentryError::Store(StoreError::WriteFailed {
        reason: format!("{}: {err}", path.display()),
    })
}

fn read_failed(path: &Path, err: &std::io::Error) -> GitsentryError {
    GitsentryError::Store(StoreError::ReadFailed {
        reason: format!("{}: {err}", path.display()),
    })
}

//! Scan coordination -- payload resolution, scanner fan-out, and
//! aggregate assembly.
//!
//! One push delivery becomes one [`AggregateReport`]: the coordinator
//! extracts the scan target from the payload, runs every enabled
//! scanner concurrently (bounded by `scanners.max_concurrent`), collects
//! each outcome into its section, and upserts the aggregate. A scanner
//! failure becomes a [`SectionOutcome::Failed`] marker in that section;
//! it never aborts the delivery.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use gitsentry_core::config::GitsentryConfig;
use gitsentry_core::error::{GitsentryError, ValidationError};
use gitsentry_core::metrics::{
    LABEL_RESULT, LABEL_SCANNER, REPORTS_STORED_TOTAL, SCAN_DURATION_SECONDS, SCANS_IN_FLIGHT,
    SCANS_TOTAL,
};
use gitsentry_core::pipeline::{DynScannerClient, ScannerKind};
use gitsentry_core::report::{AggregateReport, PushTarget, ScanSections, SectionOutcome};
use gitsentry_report_store::ReportStore;
use gitsentry_scan_engine::ToolScanner;

/// Coordinates scanner fan-out and report persistence for deliveries.
pub struct ScanCoordinator {
    clients: Vec<Arc<dyn DynScannerClient>>,
    disabled: Vec<ScannerKind>,
    store: Arc<ReportStore>,
    limiter: Arc<Semaphore>,
}

impl ScanCoordinator {
    /// Build clients for every enabled scanner in the configuration.
    pub fn from_config(config: &GitsentryConfig, store: Arc<ReportStore>) -> Self {
        let mut clients: Vec<Arc<dyn DynScannerClient>> = Vec::new();
        let mut disabled = Vec::new();

        let tools = [
            (ScannerKind::StaticAnalysis, &config.scanners.static_analysis),
            (ScannerKind::DependencyCheck, &config.scanners.dependency_check),
            (ScannerKind::SecretScan, &config.scanners.secret_scan),
            (ScannerKind::ThreatModel, &config.scanners.threat_model),
        ];
        for (kind, tool) in tools {
            if tool.enabled {
                clients.push(Arc::new(ToolScanner::new(kind, tool.clone())));
            } else {
                warn!(scanner = kind.as_str(), "scanner disabled by configuration");
                disabled.push(kind);
            }
        }

        Self::new(clients, disabled, store, config.scanners.max_concurrent)
    }

    /// Assemble from explicit parts. Integration tests inject mock
    /// clients here.
    pub fn new(
        clients: Vec<Arc<dyn DynScannerClient>>,
        disabled: Vec<ScannerKind>,
        store: Arc<ReportStore>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            clients,
            disabled,
            store,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run every scanner against the target, assemble the aggregate, and
    /// persist it.
    pub async fn process_push(
        &self,
        owner_id: Option<String>,
        target: PushTarget,
    ) -> Result<AggregateReport, GitsentryError> {
        info!(target = %target, "processing push delivery");
        let repo_url = target.repository_url();

        let mut outcomes: HashMap<ScannerKind, SectionOutcome> = ScannerKind::ALL
            .iter()
            .map(|kind| {
                (*kind, SectionOutcome::Failed {
                    scanner: kind.as_str().to_owned(),
                    reason: "scan did not complete".to_owned(),
                })
            })
            .collect();
        for kind in &self.disabled {
            outcomes.insert(*kind, SectionOutcome::Failed {
                scanner: kind.as_str().to_owned(),
                reason: "scanner disabled by configuration".to_owned(),
            });
        }

        let mut tasks = JoinSet::new();
        for client in &self.clients {
            let client = Arc::clone(client);
            let limiter = Arc::clone(&self.limiter);
            let repo_url = repo_url.clone();
            tasks.spawn(async move {
                let kind = client.kind();
                let _permit = match limiter.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (kind, Err(GitsentryError::Scanner(
                            gitsentry_core::error::ScannerError::Failed {
                                scanner: kind.as_str().to_owned(),
                                reason: "scan limiter closed".to_owned(),
                            },
                        )));
                    }
                };
                gauge!(SCANS_IN_FLIGHT).increment(1.0);
                let started = Instant::now();
                let result = client.scan(&repo_url).await;
                let elapsed = started.elapsed().as_secs_f64();
                gauge!(SCANS_IN_FLIGHT).decrement(1.0);
                histogram!(SCAN_DURATION_SECONDS, LABEL_SCANNER => kind.as_str()).record(elapsed);
                let label = if result.is_ok() { "success" } else { "failure" };
                counter!(SCANS_TOTAL, LABEL_SCANNER => kind.as_str(), LABEL_RESULT => label)
                    .increment(1);
                (kind, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Ok(payload))) => {
                    info!(scanner = kind.as_str(), "scan completed");
                    outcomes.insert(kind, SectionOutcome::Completed { payload });
                }
                Ok((kind, Err(e))) => {
                    warn!(scanner = kind.as_str(), error = %e, "scan failed");
                    outcomes.insert(kind, SectionOutcome::Failed {
                        scanner: kind.as_str().to_owned(),
                        reason: e.to_string(),
                    });
                }
                // The prefilled marker stands in for the lost section.
                Err(e) => error!(error = %e, "scan task aborted"),
            }
        }

        let mut take = |kind: ScannerKind| {
            outcomes.remove(&kind).unwrap_or(SectionOutcome::Failed {
                scanner: kind.as_str().to_owned(),
                reason: "scan did not complete".to_owned(),
            })
        };
        let sections = ScanSections {
            static_analysis: take(ScannerKind::StaticAnalysis),
            dependency_check: take(ScannerKind::DependencyCheck),
            secret_scan: take(ScannerKind::SecretScan),
            threat_model: take(ScannerKind::ThreatModel),
        };

        let report = AggregateReport {
            owner_id,
            owner: target.owner,
            repo_name: target.repo_name,
            commit_id: target.commit_id,
            branch: target.branch,
            sections,
            generated_at: chrono::Utc::now(),
        };

        self.store.upsert(&report).await?;
        counter!(REPORTS_STORED_TOTAL).increment(1);
        info!(key = %report.key(), "aggregate report stored");
        Ok(report)
    }
}

/// Extract the scan target from a push payload.
///
/// Field shapes follow the GitHub push event: `repository.name`,
/// `repository.owner.name` (falling back to `owner.login`), `ref`, and
/// `head_commit.id` (falling back to `after`).
pub fn resolve_target(payload: &[u8]) -> Result<PushTarget, GitsentryError> {
    let value: Value = serde_json::from_slice(payload).map_err(|e| {
        GitsentryError::Validation(ValidationError::MalformedPayload {
            reason: e.to_string(),
        })
    })?;

    let repo_name = required_str(&value, &["repository", "name"], "repository.name")?;
    let owner = value["repository"]["owner"]["name"]
        .as_str()
        .or_else(|| value["repository"]["owner"]["login"].as_str())
        .ok_or_else(|| missing("repository.owner.name"))?
        .to_owned();
    let git_ref = required_str(&value, &["ref"], "ref")?;
    let commit_id = value["head_commit"]["id"]
        .as_str()
        .or_else(|| value["after"].as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("head_commit.id"))?
        .to_owned();

    let branch = git_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(&git_ref)
        .to_owned();

    Ok(PushTarget {
        owner,
        repo_name,
        branch,
        commit_id,
    })
}

fn required_str(value: &Value, path: &[&str], field: &str) -> Result<String, GitsentryError> {
    let mut cursor = value;
    for segment in path {
        cursor = &cursor[segment];
    }
    cursor
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| missing(field))
}

fn missing(field: &str) -> GitsentryError {
    GitsentryError::Validation(ValidationError::MissingField {
        field: field.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn push_payload() -> Vec<u8> {
        json!({
            "ref": "refs/heads/main",
            "after": "ffff000011112222",
            "head_commit": {"id": "abcdef1234567890"},
            "repository": {
                "name": "hello-world",
                "owner": {"name": "octocat", "login": "octocat-login"},
            },
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn resolves_a_complete_push_payload() {
        let target = resolve_target(&push_payload()).expect("resolve");
        assert_eq!(target.owner, "octocat");
        assert_eq!(target.repo_name, "hello-world");
        assert_eq!(target.branch, "main");
        assert_eq!(target.commit_id, "abcdef1234567890");
    }

    #[test]
    fn owner_login_is_the_fallback() {
        let payload = json!({
            "ref": "refs/heads/dev",
            "head_commit": {"id": "abc"},
            "repository": {"name": "r", "owner": {"login": "octocat-login"}},
        })
        .to_string();
        let target = resolve_target(payload.as_bytes()).expect("resolve");
        assert_eq!(target.owner, "octocat-login");
    }

    #[test]
    fn after_is_the_commit_fallback() {
        let payload = json!({
            "ref": "refs/heads/dev",
            "after": "ffff0000",
            "repository": {"name": "r", "owner": {"name": "o"}},
        })
        .to_string();
        let target = resolve_target(payload.as_bytes()).expect("resolve");
        assert_eq!(target.commit_id, "ffff0000");
    }

    #[test]
    fn tag_refs_keep_their_full_name() {
        let payload = json!({
            "ref": "refs/tags/v1.0",
            "head_commit": {"id": "abc"},
            "repository": {"name": "r", "owner": {"name": "o"}},
        })
        .to_string();
        let target = resolve_target(payload.as_bytes()).expect("resolve");
        assert_eq!(target.branch, "refs/tags/v1.0");
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let payload = json!({"ref": "refs/heads/main"}).to_string();
        let err = resolve_target(payload.as_bytes()).expect_err("must fail");
        assert!(matches!(
            err,
            GitsentryError::Validation(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = resolve_target(b"not json").expect_err("must fail");
        assert!(matches!(
            err,
            GitsentryError::Validation(ValidationError::MalformedPayload { .. })
        ));
    }
}

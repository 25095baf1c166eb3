//! Report data model -- the aggregate produced by one scanned commit.
//!
//! An [`AggregateReport`] combines the outputs of all scanner collaborators
//! for a single push. Exactly one report exists per
//! `(owner_id, owner, repo_name, commit_id)` key; re-delivery of the same
//! commit replaces the stored record (last-write-wins, no history).
//!
//! Section payloads are opaque structured values: each scanner defines its
//! own fields, and the renderer reads them defensively. A scanner failure
//! is a first-class outcome ([`SectionOutcome::Failed`]) carrying the
//! scanner identity and cause, never a pipeline-wide abort.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scan target derived from one push delivery. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    /// Repository owner login
    pub owner: String,
    /// Repository name
    pub repo_name: String,
    /// Branch name (`refs/heads/` prefix stripped)
    pub branch: String,
    /// Head commit SHA of the push
    pub commit_id: String,
}

impl PushTarget {
    /// Clone URL for the target repository.
    pub fn repository_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo_name)
    }
}

impl fmt::Display for PushTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{} ({})",
            self.owner, self.repo_name, self.branch, self.commit_id,
        )
    }
}

/// Outcome of one scanner section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// The scanner completed and produced a structured payload.
    Completed {
        /// Tool-defined result structure
        payload: serde_json::Value,
    },
    /// The scanner did not produce a result.
    Failed {
        /// Scanner identity (e.g. "secret-scan")
        scanner: String,
        /// Failure cause, suitable for display
        reason: String,
    },
}

impl SectionOutcome {
    /// The payload, if this section completed.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Completed { payload } => Some(payload),
            Self::Failed { .. } => None,
        }
    }

    /// Whether this section is a failure marker.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// The four scanner sections of an aggregate report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSections {
    /// Static analysis findings (semgrep-shaped)
    pub static_analysis: SectionOutcome,
    /// Dependency vulnerabilities (dependency-check-shaped)
    pub dependency_check: SectionOutcome,
    /// Leaked secret findings (gitleaks-shaped)
    pub secret_scan: SectionOutcome,
    /// Threat model output
    pub threat_model: SectionOutcome,
}

/// One aggregate report: the combined scanner output for one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Resolving user id, if a registered binding matched the delivery
    pub owner_id: Option<String>,
    /// Repository owner login
    pub owner: String,
    /// Repository name
    pub repo_name: String,
    /// Commit SHA this report describes
    pub commit_id: String,
    /// Branch the push landed on
    pub branch: String,
    /// Per-scanner section outcomes
    pub sections: ScanSections,
    /// Aggregation timestamp
    pub generated_at: DateTime<Utc>,
}

impl AggregateReport {
    /// The persistence key for this report.
    pub fn key(&self) -> ReportKey {
        ReportKey {
            owner_id: self.owner_id.clone(),
            owner: self.owner.clone(),
            repo_name: self.repo_name.clone(),
            commit_id: self.commit_id.clone(),
        }
    }
}

/// Unique persistence key: `(owner_id, owner, repo_name, commit_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    /// Resolving user id (`None` for unmatched deliveries)
    pub owner_id: Option<String>,
    /// Repository owner login
    pub owner: String,
    /// Repository name
    pub repo_name: String,
    /// Commit SHA
    pub commit_id: String,
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.owner_id.as_deref().unwrap_or("anonymous"),
            self.owner,
            self.repo_name,
            self.commit_id,
        )
    }
}

/// Lightweight listing projection: excludes section payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Commit SHA
    #[serde(rename = "commitId")]
    pub commit_id: String,
    /// Aggregation timestamp
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report() -> AggregateReport {
        AggregateReport {
            owner_id: Some("u1".to_owned()),
            owner: "octocat".to_owned(),
            repo_name: "hello-world".to_owned(),
            commit_id: "abcdef1234567890".to_owned(),
            branch: "main".to_owned(),
            sections: ScanSections {
                static_analysis: SectionOutcome::Completed {
                    payload: json!({"summary": {"total_findings": 2}}),
                },
                dependency_check: SectionOutcome::Failed {
                    scanner: "dependency-check".to_owned(),
                    reason: "timed out after 900s".to_owned(),
                },
                secret_scan: SectionOutcome::Completed {
                    payload: json!({"totalFindings": 0, "findings": []}),
                },
                threat_model: SectionOutcome::Completed {
                    payload: json!({"summary": {"totalThreats": 1}}),
                },
            },
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn push_target_repository_url() {
        let target = PushTarget {
            owner: "octocat".to_owned(),
            repo_name: "hello-world".to_owned(),
            branch: "main".to_owned(),
            commit_id: "abc".to_owned(),
        };
        assert_eq!(
            target.repository_url(),
            "https://github.com/octocat/hello-world.git"
        );
    }

    #[test]
    fn section_outcome_round_trips_through_json() {
        let report = sample_report();
        let encoded = serde_json::to_string(&report).expect("serialize");
        let decoded: AggregateReport = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, report);
        assert!(decoded.sections.dependency_check.is_failed());
        assert!(decoded.sections.secret_scan.payload().is_some());
    }

    #[test]
    fn failed_section_serializes_with_status_tag() {
        let outcome = SectionOutcome::Failed {
            scanner: "secret-scan".to_owned(),
            reason: "clone failed".to_owned(),
        };
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["scanner"], "secret-scan");
    }

    #[test]
    fn report_key_display_uses_anonymous_for_unmatched() {
        let mut report = sample_report();
        report.owner_id = None;
        assert!(report.key().to_string().starts_with("anonymous/octocat/"));
    }
}

//! Tool-backed scanner clients.
//!
//! [`ToolScanner`] is one [`ScannerClient`] per analysis kind. All four
//! share the clone/invoke/parse flow; what differs per kind is the
//! command line, how the exit status is interpreted, and where the
//! result lives (stdout or a report file).

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use gitsentry_core::config::ToolConfig;
use gitsentry_core::error::GitsentryError;
use gitsentry_core::pipeline::{ScannerClient, ScannerKind};

use crate::error::ScanEngineError;
use crate::exec::{self, CapturedOutput};
use crate::parse;
use crate::workspace::ScanWorkspace;

/// Name of the JSON report dependency-check writes into its output dir.
const DEPENDENCY_CHECK_REPORT: &str = "dependency-check-report.json";

/// A scanner client that shells out to an external analysis tool.
#[derive(Debug, Clone)]
pub struct ToolScanner {
    kind: ScannerKind,
    config: ToolConfig,
}

impl ToolScanner {
    pub fn new(kind: ScannerKind, config: ToolConfig) -> Self {
        Self { kind, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn run(&self, repo_url: &str) -> Result<Value, ScanEngineError> {
        let id = self.kind.as_str();
        let workspace = ScanWorkspace::clone_repository(id, repo_url).await?;
        info!(scanner = id, repo_url, "repository cloned, starting analysis");

        let payload = match self.kind {
            ScannerKind::StaticAnalysis => self.run_static_analysis(workspace.path()).await?,
            ScannerKind::DependencyCheck => self.run_dependency_check(workspace.path()).await?,
            ScannerKind::SecretScan => self.run_secret_scan(workspace.path()).await?,
            ScannerKind::ThreatModel => self.run_threat_model(workspace.path()).await?,
        };

        info!(scanner = id, repo_url, "analysis completed");
        Ok(payload)
    }

    /// semgrep writes its JSON findings to stdout. Exit 1 means
    /// "findings found" and is a successful run.
    async fn run_static_analysis(&self, workspace: &Path) -> Result<Value, ScanEngineError> {
        let id = self.kind.as_str();
        let target = path_str(id, workspace)?;
        let out = exec::run_tool(
            id,
            &self.config.bin_path,
            &["--config", "auto", "--json", target],
            None,
            self.timeout(),
            self.config.max_output_bytes,
        )
        .await?;
        self.check_status(&out, &[0, 1])?;
        parse::normalize_static_analysis(id, &out.stdout)
    }

    /// dependency-check writes a JSON report file into `--out`; stdout is
    /// progress noise only.
    async fn run_dependency_check(&self, workspace: &Path) -> Result<Value, ScanEngineError> {
        let id = self.kind.as_str();
        let target = path_str(id, workspace)?;

        let report_dir = tempfile::Builder::new()
            .prefix("gitsentry-depcheck-")
            .tempdir()
            .map_err(|e| ScanEngineError::Io {
                scanner: id.to_owned(),
                reason: e.to_string(),
            })?;
        let report_out = path_str(id, report_dir.path())?.to_owned();

        let out = exec::run_tool(
            id,
            &self.config.bin_path,
            &[
                "--project",
                "RepoScan",
                "--scan",
                target,
                "--format",
                "JSON",
                "--out",
                &report_out,
            ],
            None,
            self.timeout(),
            self.config.max_output_bytes,
        )
        .await?;
        self.check_status(&out, &[0])?;

        let report = read_report(id, &report_dir.path().join(DEPENDENCY_CHECK_REPORT))?;
        parse::normalize_dependency_check(id, &report)
    }

    /// gitleaks writes findings to `--report-path`. Exit 1 means "leaks
    /// found" and is a successful run; a missing or garbled report file
    /// degrades to an empty finding list.
    async fn run_secret_scan(&self, workspace: &Path) -> Result<Value, ScanEngineError> {
        let id = self.kind.as_str();
        let target = path_str(id, workspace)?;

        let report_dir = tempfile::Builder::new()
            .prefix("gitsentry-gitleaks-")
            .tempdir()
            .map_err(|e| ScanEngineError::Io {
                scanner: id.to_owned(),
                reason: e.to_string(),
            })?;
        let report_path = report_dir.path().join("gitleaks-report.json");
        let report_arg = path_str(id, &report_path)?.to_owned();

        let out = exec::run_tool(
            id,
            &self.config.bin_path,
            &[
                "detect",
                "--source",
                target,
                "--report-path",
                &report_arg,
                "--report-format",
                "json",
            ],
            None,
            self.timeout(),
            self.config.max_output_bytes,
        )
        .await?;
        self.check_status(&out, &[0, 1])?;

        let report = std::fs::read(&report_path).unwrap_or_default();
        Ok(parse::normalize_secret_scan(id, &report))
    }

    /// The threat-model tool prints its JSON assessment to stdout.
    async fn run_threat_model(&self, workspace: &Path) -> Result<Value, ScanEngineError> {
        let id = self.kind.as_str();
        let target = path_str(id, workspace)?;
        let out = exec::run_tool(
            id,
            &self.config.bin_path,
            &["--repo", target, "--json"],
            None,
            self.timeout(),
            self.config.max_output_bytes,
        )
        .await?;
        self.check_status(&out, &[0])?;
        parse::parse_threat_model(id, &out.stdout)
    }

    fn check_status(&self, out: &CapturedOutput, accepted: &[i32]) -> Result<(), ScanEngineError> {
        if accepted.contains(&out.status) {
            Ok(())
        } else {
            Err(ScanEngineError::ToolFailed {
                scanner: self.kind.as_str().to_owned(),
                status: out.status,
                stderr_excerpt: out.stderr_excerpt(),
            })
        }
    }
}

impl ScannerClient for ToolScanner {
    fn kind(&self) -> ScannerKind {
        self.kind
    }

    async fn scan(&self, repo_url: &str) -> Result<Value, GitsentryError> {
        Ok(self.run(repo_url).await?)
    }
}

fn path_str<'a>(scanner: &str, path: &'a Path) -> Result<&'a str, ScanEngineError> {
    path.to_str().ok_or_else(|| ScanEngineError::Io {
        scanner: scanner.to_owned(),
        reason: "non-utf8 path".to_owned(),
    })
}

fn read_report(scanner: &str, path: &Path) -> Result<Vec<u8>, ScanEngineError> {
    if !path.exists() {
        return Err(ScanEngineError::ReportMissing {
            scanner: scanner.to_owned(),
        });
    }
    std::fs::read(path).map_err(|e| ScanEngineError::Io {
        scanner: scanner.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    /// Create a throwaway git repository with one commit, usable as a
    /// local clone source.
    fn seed_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .status()
                .expect("git");
            assert!(status.success(), "git {args:?} failed");
        };
        run(&["init", "--quiet"]);
        std::fs::write(dir.path().join("README.md"), "seed\n").expect("write");
        run(&["add", "."]);
        run(&[
            "-c",
            "user.email=ci@example.com",
            "-c",
            "user.name=ci",
            "commit",
            "--quiet",
            "-m",
            "seed",
        ]);
        dir
    }

    /// Write an executable shell script standing in for a tool binary.
    fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = std::fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod");
        path.to_str().expect("utf8").to_owned()
    }

    fn tool_config(bin_path: String) -> ToolConfig {
        ToolConfig {
            enabled: true,
            bin_path,
            timeout_secs: 30,
            max_output_bytes: 1024 * 1024,
        }
    }

    #[tokio::test]
    async fn static_analysis_accepts_findings_exit_status() {
        let repo = seed_repo();
        let bins = tempfile::tempdir().expect("tempdir");
        let bin = fake_tool(
            bins.path(),
            "semgrep",
            r#"printf '{"results":[{"check_id":"r","path":"a.rs","start":{"line":1},"extra":{"severity":"WARNING","message":"m"}}]}'; exit 1"#,
        );

        let scanner = ToolScanner::new(ScannerKind::StaticAnalysis, tool_config(bin));
        let repo_url = repo.path().to_str().unwrap();
        let payload = scanner.scan(repo_url).await.expect("scan");
        assert_eq!(payload["summary"]["total_findings"], 1);
        assert_eq!(payload["findings"][0]["severity"], "WARNING");
    }

    #[tokio::test]
    async fn static_analysis_rejects_hard_failure_status() {
        let repo = seed_repo();
        let bins = tempfile::tempdir().expect("tempdir");
        let bin = fake_tool(bins.path(), "semgrep", "echo boom >&2; exit 2");

        let scanner = ToolScanner::new(ScannerKind::StaticAnalysis, tool_config(bin));
        let err = scanner
            .run(repo.path().to_str().unwrap())
            .await
            .expect_err("must fail");
        match err {
            ScanEngineError::ToolFailed { status, stderr_excerpt, .. } => {
                assert_eq!(status, 2);
                assert_eq!(stderr_excerpt, "boom");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn dependency_check_reads_report_file() {
        let repo = seed_repo();
        let bins = tempfile::tempdir().expect("tempdir");
        // The fake tool writes the report into the dir given via --out
        // (8th positional arg of the generated command line).
        let bin = fake_tool(
            bins.path(),
            "dependency-check.sh",
            r#"out="$8"; printf '{"dependencies":[{"fileName":"x.jar","vulnerabilities":[{"name":"CVE-1","severity":"HIGH","cvssv3":{"baseScore":8.1}}]}]}' > "$out/dependency-check-report.json""#,
        );

        let scanner = ToolScanner::new(ScannerKind::DependencyCheck, tool_config(bin));
        let payload = scanner
            .scan(repo.path().to_str().unwrap())
            .await
            .expect("scan");
        assert_eq!(payload["summary"]["vulnerable_dependencies"], 1);
        assert_eq!(payload["vulnerabilities"][0]["cve"], "CVE-1");
    }

    #[tokio::test]
    async fn dependency_check_missing_report_is_an_error() {
        let repo = seed_repo();
        let bins = tempfile::tempdir().expect("tempdir");
        let bin = fake_tool(bins.path(), "dependency-check.sh", "exit 0");

        let scanner = ToolScanner::new(ScannerKind::DependencyCheck, tool_config(bin));
        let err = scanner
            .run(repo.path().to_str().unwrap())
            .await
            .expect_err("must fail");
        assert!(matches!(err, ScanEngineError::ReportMissing { .. }));
    }

    #[tokio::test]
    async fn secret_scan_treats_leaks_exit_as_success() {
        let repo = seed_repo();
        let bins = tempfile::tempdir().expect("tempdir");
        // --report-path is the 5th positional arg of the generated line.
        let bin = fake_tool(
            bins.path(),
            "gitleaks",
            r#"printf '[{"RuleID":"aws-access-token","File":".env"}]' > "$5"; exit 1"#,
        );

        let scanner = ToolScanner::new(ScannerKind::SecretScan, tool_config(bin));
        let payload = scanner
            .scan(repo.path().to_str().unwrap())
            .await
            .expect("scan");
        assert_eq!(payload["totalFindings"], 1);
        assert_eq!(payload["findings"][0]["RuleID"], "aws-access-token");
    }

    #[tokio::test]
    async fn secret_scan_missing_report_degrades_to_empty() {
        let repo = seed_repo();
        let bins = tempfile::tempdir().expect("tempdir");
        let bin = fake_tool(bins.path(), "gitleaks", "exit 0");

        let scanner = ToolScanner::new(ScannerKind::SecretScan, tool_config(bin));
        let payload = scanner
            .scan(repo.path().to_str().unwrap())
            .await
            .expect("scan");
        assert_eq!(payload["totalFindings"], 0);
    }

    #[tokio::test]
    async fn threat_model_parses_stdout() {
        let repo = seed_repo();
        let bins = tempfile::tempdir().expect("tempdir");
        let bin = fake_tool(
            bins.path(),
            "threat-model",
            r#"printf '{"summary":{"totalThreats":0},"threats":[]}'"#,
        );

        let scanner = ToolScanner::new(ScannerKind::ThreatModel, tool_config(bin));
        let payload = scanner
            .scan(repo.path().to_str().unwrap())
            .await
            .expect("scan");
        assert_eq!(payload["summary"]["totalThreats"], 0);
    }

    #[tokio::test]
    async fn clone_failure_surfaces_through_scan() {
        let scanner = ToolScanner::new(
            ScannerKind::ThreatModel,
            tool_config("threat-model".to_owned()),
        );
        let err = scanner
            .scan("file:///nonexistent/repo.git")
            .await
            .expect_err("must fail");
        assert!(matches!(err, GitsentryError::Scanner(_)));
    }
}

//! Temporary scan workspaces.
//!
//! Each scan clones the target repository into a fresh temporary
//! directory. The directory is owned by a `TempDir`, so it is removed on
//! every exit path (success, scan error, timeout, or panic unwind),
//! which bounds disk usage when many pushes arrive together.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::ScanEngineError;
use crate::exec;

/// Wall-clock budget for the clone itself, separate from tool budgets.
const CLONE_TIMEOUT: Duration = Duration::from_secs(300);

/// Output cap for git; clone progress output is small.
const CLONE_OUTPUT_CAP: usize = 1024 * 1024;

/// A cloned repository in a self-deleting temporary directory.
#[derive(Debug)]
pub struct ScanWorkspace {
    dir: tempfile::TempDir,
}

impl ScanWorkspace {
    /// Shallow-clone `repo_url` into a fresh temporary directory.
    pub async fn clone_repository(scanner: &str, repo_url: &str) -> Result<Self, ScanEngineError> {
        let dir = tempfile::Builder::new()
            .prefix("gitsentry-scan-")
            .tempdir()
            .map_err(|e| ScanEngineError::Io {
                scanner: scanner.to_owned(),
                reason: e.to_string(),
            })?;

        let target = dir
            .path()
            .to_str()
            .ok_or_else(|| ScanEngineError::Io {
                scanner: scanner.to_owned(),
                reason: "non-utf8 temp path".to_owned(),
            })?
            .to_owned();

        debug!(scanner, repo_url, "cloning repository");
        let out = exec::run_tool(
            scanner,
            "git",
            &["clone", "--depth", "1", repo_url, &target],
            None,
            CLONE_TIMEOUT,
            CLONE_OUTPUT_CAP,
        )
        .await?;

        if out.status != 0 {
            return Err(ScanEngineError::CloneFailed {
                scanner: scanner.to_owned(),
                repo_url: repo_url.to_owned(),
                reason: out.stderr_excerpt(),
            });
        }

        Ok(Self { dir })
    }

    /// Path to the cloned working tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

//! Bounded external process execution.
//!
//! Every tool invocation runs under a wall-clock timeout with
//! `kill_on_drop`, so an expired or abandoned invocation never leaves a
//! process behind. Captured stdout/stderr are checked against a byte cap
//! after completion to bound memory use on pathological tool output.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{ScanEngineError, stderr_excerpt};

/// Output captured from one completed tool invocation.
#[derive(Debug)]
pub struct CapturedOutput {
    /// Exit status code (-1 when terminated by signal)
    pub status: i32,
    /// Full captured stdout
    pub stdout: Vec<u8>,
    /// Full captured stderr
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    /// First line of stderr, truncated for error display.
    pub fn stderr_excerpt(&self) -> String {
        stderr_excerpt(&self.stderr)
    }
}

/// Run `bin` with `args` in `cwd` under a timeout and output cap.
///
/// The child is spawned with `kill_on_drop`, so hitting the timeout (or
/// the caller being cancelled) terminates the process. A non-zero exit
/// status is NOT an error here; interpreting the status is up to the
/// caller, because several tools use non-zero exits to mean "findings
/// found".
pub async fn run_tool(
    scanner: &str,
    bin: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
    max_output_bytes: usize,
) -> Result<CapturedOutput, ScanEngineError> {
    debug!(scanner, bin, ?args, "invoking tool");

    let mut command = Command::new(bin);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|e| ScanEngineError::SpawnFailed {
        scanner: scanner.to_owned(),
        bin: bin.to_owned(),
        reason: e.to_string(),
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ScanEngineError::Timeout {
            scanner: scanner.to_owned(),
            timeout_secs: timeout.as_secs(),
        })?
        .map_err(|e| ScanEngineError::Io {
            scanner: scanner.to_owned(),
            reason: e.to_string(),
        })?;

    if output.stdout.len() > max_output_bytes || output.stderr.len() > max_output_bytes {
        return Err(ScanEngineError::OutputTooLarge {
            scanner: scanner.to_owned(),
            max_bytes: max_output_bytes,
        });
    }

    let status = output.status.code().unwrap_or(-1);
    debug!(
        scanner,
        status,
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "tool completed"
    );

    Ok(CapturedOutput {
        status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

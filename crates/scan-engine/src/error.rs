//! Scan engine error types.
//!
//! [`ScanEngineError`] covers every failure mode of one tool invocation.
//! `From<ScanEngineError> for GitsentryError` maps each variant onto the
//! core [`ScannerError`] taxonomy so the coordinator can downgrade it to
//! a per-section failure marker.
//!
//! Display strings intentionally omit workspace paths: they end up in
//! stored failure markers and HTTP error details.
//!
//! [`ScannerError`]: gitsentry_core::error::ScannerError

use gitsentry_core::error::{GitsentryError, ScannerError};

/// Scan engine domain error.
#[derive(Debug, thiserror::Error)]
pub enum ScanEngineError {
    /// Repository clone failed
    #[error("scanner '{scanner}' clone of '{repo_url}' failed: {reason}")]
    CloneFailed {
        /// Scanner identity
        scanner: String,
        /// Clone URL
        repo_url: String,
        /// First line of git stderr
        reason: String,
    },

    /// Tool binary could not be spawned
    #[error("scanner '{scanner}' could not start '{bin}': {reason}")]
    SpawnFailed {
        /// Scanner identity
        scanner: String,
        /// Binary name as configured
        bin: String,
        /// OS error text
        reason: String,
    },

    /// Tool exited with an unexpected status
    #[error("scanner '{scanner}' exited with status {status}: {stderr_excerpt}")]
    ToolFailed {
        /// Scanner identity
        scanner: String,
        /// Exit status code (-1 when killed by signal)
        status: i32,
        /// Leading portion of stderr
        stderr_excerpt: String,
    },

    /// Tool exceeded its wall-clock budget
    #[error("scanner '{scanner}' timed out after {timeout_secs}s")]
    Timeout {
        /// Scanner identity
        scanner: String,
        /// Configured budget
        timeout_secs: u64,
    },

    /// Captured output exceeded the configured cap
    #[error("scanner '{scanner}' output exceeded {max_bytes} bytes")]
    OutputTooLarge {
        /// Scanner identity
        scanner: String,
        /// Configured cap
        max_bytes: usize,
    },

    /// Tool completed but its report file is absent
    #[error("scanner '{scanner}' produced no report file")]
    ReportMissing {
        /// Scanner identity
        scanner: String,
    },

    /// Tool output could not be parsed
    #[error("scanner '{scanner}' produced unparseable output: {reason}")]
    ParseFailed {
        /// Scanner identity
        scanner: String,
        /// Parse failure cause
        reason: String,
    },

    /// Workspace I/O failed
    #[error("scanner '{scanner}' workspace io error: {reason}")]
    Io {
        /// Scanner identity
        scanner: String,
        /// I/O error text
        reason: String,
    },
}

impl ScanEngineError {
    /// The identity of the scanner this error originated from.
    pub fn scanner(&self) -> &str {
        match self {
            Self::CloneFailed { scanner, .. }
            | Self::SpawnFailed { scanner, .. }
            | Self::ToolFailed { scanner, .. }
            | Self::Timeout { scanner, .. }
            | Self::OutputTooLarge { scanner, .. }
            | Self::ReportMissing { scanner, .. }
            | Self::ParseFailed { scanner, .. }
            | Self::Io { scanner, .. } => scanner,
        }
    }
}

impl From<ScanEngineError> for GitsentryError {
    fn from(err: ScanEngineError) -> Self {
        let scanner = err.scanner().to_owned();
        match err {
            ScanEngineError::Timeout { timeout_secs, .. } => {
                GitsentryError::Scanner(ScannerError::Timeout {
                    scanner,
                    timeout_secs,
                })
            }
            ScanEngineError::ParseFailed { reason, .. } => {
                GitsentryError::Scanner(ScannerError::ParseFailed { scanner, reason })
            }
            other => GitsentryError::Scanner(ScannerError::Failed {
                scanner,
                reason: other.to_string(),
            }),
        }
    }
}

/// Take the first line of tool stderr, truncated for error display.
/// Truncation counts chars, not bytes; stderr is arbitrary tool output
/// and may put a multi-byte character anywhere.
pub(crate) fn stderr_excerpt(stderr: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(stderr);
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > MAX {
        let cut: String = line.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        line.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_scanner_timeout() {
        let err = ScanEngineError::Timeout {
            scanner: "static-analysis".to_owned(),
            timeout_secs: 600,
        };
        let top: GitsentryError = err.into();
        assert!(matches!(
            top,
            GitsentryError::Scanner(ScannerError::Timeout { timeout_secs: 600, .. })
        ));
    }

    #[test]
    fn parse_failure_maps_to_scanner_parse_failed() {
        let err = ScanEngineError::ParseFailed {
            scanner: "secret-scan".to_owned(),
            reason: "expected array".to_owned(),
        };
        let top: GitsentryError = err.into();
        assert!(matches!(
            top,
            GitsentryError::Scanner(ScannerError::ParseFailed { .. })
        ));
    }

    #[test]
    fn tool_failure_maps_to_scanner_failed_with_identity() {
        let err = ScanEngineError::ToolFailed {
            scanner: "dependency-check".to_owned(),
            status: 2,
            stderr_excerpt: "missing NVD key".to_owned(),
        };
        let top: GitsentryError = err.into();
        match top {
            GitsentryError::Scanner(ScannerError::Failed { scanner, reason }) => {
                assert_eq!(scanner, "dependency-check");
                assert!(reason.contains("missing NVD key"));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn stderr_excerpt_takes_first_line() {
        let excerpt = stderr_excerpt(b"fatal: repository not found\nhint: check the url\n");
        assert_eq!(excerpt, "fatal: repository not found");
    }

    #[test]
    fn stderr_excerpt_truncates_long_lines() {
        let long = vec![b'x'; 500];
        let excerpt = stderr_excerpt(&long);
        assert!(excerpt.len() <= 204);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn stderr_excerpt_handles_multibyte_lines() {
        // 100 chars but 300 bytes; must come through intact.
        let short = "€".repeat(100);
        assert_eq!(stderr_excerpt(short.as_bytes()), short);

        // Over the cap in chars; the cut must land on a char boundary.
        let long = "é".repeat(250);
        let excerpt = stderr_excerpt(long.as_bytes());
        assert_eq!(excerpt.chars().count(), 203);
        assert!(excerpt.ends_with("..."));
    }
}

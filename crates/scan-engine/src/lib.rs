//! External scanner invocation for GitSentry.
//!
//! Each scan is the same four-step flow the scanning collaborators share:
//!
//! ```text
//! repo_url --> ScanWorkspace (shallow clone into TempDir)
//!                  |
//!              exec::run_tool (timeout, bounded capture, kill_on_drop)
//!                  |
//!              parse::normalize_* (tool output -> section payload)
//!                  |
//!              TempDir drop (workspace removed on every exit path)
//! ```
//!
//! [`ToolScanner`] implements the [`ScannerClient`] contract from
//! `gitsentry-core` for all four analysis kinds; which tool runs and how
//! is driven entirely by [`ToolConfig`].
//!
//! [`ScannerClient`]: gitsentry_core::ScannerClient
//! [`ToolConfig`]: gitsentry_core::ToolConfig

pub mod error;
pub mod exec;
pub mod parse;
pub mod scanner;
pub mod workspace;

pub use error::ScanEngineError;
pub use exec::CapturedOutput;
pub use scanner::ToolScanner;
pub use workspace::ScanWorkspace;

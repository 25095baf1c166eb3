//! Shared types, traits, errors, and configuration for GitSentry.
//!
//! Every other crate in the workspace depends on this one. It defines:
//!
//! - the error taxonomy ([`GitsentryError`] and its domain sub-enums)
//! - the unified configuration ([`GitsentryConfig`], loaded from
//!   `gitsentry.toml` with environment overrides)
//! - the report data model ([`AggregateReport`], [`SectionOutcome`])
//! - the scanner-client contract ([`ScannerClient`] / [`DynScannerClient`])
//! - webhook signature verification ([`verify_signature`])
//! - central metric name constants ([`metrics`])

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod signature;

// --- Main type re-exports ---
// Core types of each module, usable directly from the crate root.

// Errors
pub use error::{
    AuthError, ConfigError, GitsentryError, RenderError, ScannerError, StoreError,
    ValidationError,
};

// Configuration
pub use config::{GitsentryConfig, RepoBinding, ScannersConfig, ServerConfig, ToolConfig};

// Report model
pub use report::{
    AggregateReport, PushTarget, ReportKey, ReportSummary, ScanSections, SectionOutcome,
};

// Scanner contract
pub use pipeline::{BoxFuture, DynScannerClient, ScannerClient, ScannerKind};

// Signature verification
pub use signature::verify_signature;

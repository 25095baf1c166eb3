//! Error types -- the GitSentry error taxonomy.
//!
//! [`GitsentryError`] is the top-level error of the workspace. Each domain
//! defines its own sub-enum, and crate-local errors (scan engine, store,
//! renderer) convert into it via `From` so `?` propagates naturally.
//!
//! HTTP mapping (applied by the server):
//! - [`AuthError`] -> 401
//! - [`ValidationError`] -> 400
//! - `NotFound` -> 404
//! - [`ScannerError`] -> recorded as a per-section failure marker, never
//!   fatal to a delivery
//! - [`StoreError`], [`RenderError`] -> 500

/// Top-level GitSentry error type.
#[derive(Debug, thiserror::Error)]
pub enum GitsentryError {
    /// Configuration error
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Webhook authentication error
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payload/parameter validation error
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Scanner invocation error
    #[error("scanner error: {0}")]
    Scanner(#[from] ScannerError),

    /// Report persistence error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Document rendering error
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file missing
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration could not be parsed
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A configuration value failed validation
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Webhook authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Signature header missing, malformed, or digest mismatch
    #[error("invalid signature")]
    InvalidSignature,
}

/// Payload and request parameter validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A required payload field is absent
    #[error("missing payload field: {field}")]
    MissingField { field: String },

    /// Payload body is not valid JSON
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

/// Scanner invocation errors.
///
/// Always carries the scanner identity so a failed section in the
/// aggregate names which stage failed.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// Tool execution failed (spawn, exit status, missing report)
    #[error("scanner '{scanner}' failed: {reason}")]
    Failed { scanner: String, reason: String },

    /// Tool exceeded its time budget
    #[error("scanner '{scanner}' timed out after {timeout_secs}s")]
    Timeout { scanner: String, timeout_secs: u64 },

    /// Tool output could not be parsed
    #[error("scanner '{scanner}' produced unparseable output: {reason}")]
    ParseFailed { scanner: String, reason: String },
}

impl ScannerError {
    /// The identity of the scanner this error originated from.
    pub fn scanner(&self) -> &str {
        match self {
            Self::Failed { scanner, .. }
            | Self::Timeout { scanner, .. }
            | Self::ParseFailed { scanner, .. } => scanner,
        }
    }
}

/// Report persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key component would escape the store root
    #[error("invalid key component: '{component}'")]
    InvalidKey { component: String },

    /// Report serialization failed
    #[error("report serialization failed: {reason}")]
    Serialize { reason: String },

    /// Disk write failed
    #[error("store write failed: {reason}")]
    WriteFailed { reason: String },

    /// Disk read failed
    #[error("store read failed: {reason}")]
    ReadFailed { reason: String },
}

/// Document rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// PDF byte assembly failed
    #[error("pdf assembly failed: {reason}")]
    Pdf { reason: String },

    /// Built-in font could not be registered
    #[error("font registration failed: {reason}")]
    Font { reason: String },
}

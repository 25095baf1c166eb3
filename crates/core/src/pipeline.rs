//! Scanner-client contract -- the seam between coordination and tools.
//!
//! Each analysis kind (static analysis, dependency check, secret scan,
//! threat model) is invoked through the same narrow contract: hand the
//! client a repository URL, get back a structured JSON payload or a typed
//! error naming the scanner.
//!
//! [`ScannerClient`] uses return-position `impl Trait`, so `dyn
//! ScannerClient` is not possible; [`DynScannerClient`] returns a
//! [`BoxFuture`] and is implemented for every `ScannerClient` via a
//! blanket impl, enabling `Arc<dyn DynScannerClient>` fan-out.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::GitsentryError;

/// Boxed future alias used by the dyn-compatible trait.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The four analysis kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScannerKind {
    /// Static code analysis (semgrep)
    StaticAnalysis,
    /// Dependency vulnerability check (OWASP dependency-check)
    DependencyCheck,
    /// Secret scanning (gitleaks)
    SecretScan,
    /// Lightweight threat modeling
    ThreatModel,
}

impl ScannerKind {
    /// All kinds, in aggregate-report section order.
    pub const ALL: [ScannerKind; 4] = [
        ScannerKind::StaticAnalysis,
        ScannerKind::DependencyCheck,
        ScannerKind::SecretScan,
        ScannerKind::ThreatModel,
    ];

    /// Stable string id, used in logs, metrics labels, and failure markers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StaticAnalysis => "static-analysis",
            Self::DependencyCheck => "dependency-check",
            Self::SecretScan => "secret-scan",
            Self::ThreatModel => "threat-model",
        }
    }
}

impl fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scanning collaborator.
///
/// A call wraps "clone repository, invoke tool, parse output, cleanup"
/// behind a single future. Implementations must treat expected non-zero
/// exit statuses ("findings found") as success.
pub trait ScannerClient: Send + Sync {
    /// Which analysis this client performs.
    fn kind(&self) -> ScannerKind;

    /// Scan the repository at `repo_url` and return the structured result.
    fn scan(
        &self,
        repo_url: &str,
    ) -> impl Future<Output = Result<serde_json::Value, GitsentryError>> + Send;
}

/// dyn-compatible scanner client.
///
/// `ScannerClient` uses RPITIT, so `dyn ScannerClient` is not allowed.
/// `DynScannerClient` returns a [`BoxFuture`] so clients can be held as
/// `Arc<dyn DynScannerClient>`.
pub trait DynScannerClient: Send + Sync {
    /// Which analysis this client performs.
    fn kind(&self) -> ScannerKind;

    /// Scan the repository at `repo_url` and return the structured result.
    fn scan<'a>(&'a self, repo_url: &'a str)
    -> BoxFuture<'a, Result<serde_json::Value, GitsentryError>>;
}

/// Every `ScannerClient` is automatically a `DynScannerClient`.
impl<T: ScannerClient> DynScannerClient for T {
    fn kind(&self) -> ScannerKind {
        ScannerClient::kind(self)
    }

    fn scan<'a>(
        &'a self,
        repo_url: &'a str,
    ) -> BoxFuture<'a, Result<serde_json::Value, GitsentryError>> {
        Box::pin(ScannerClient::scan(self, repo_url))
    }
}

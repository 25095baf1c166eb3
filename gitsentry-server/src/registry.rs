//! Repository binding resolution.
//!
//! Deliveries arrive either on the tokenized route
//! (`/api/github/webhook/{token}`), which maps to exactly one binding
//! before the body is touched, or on the bare route, where the binding
//! is matched on `(owner, repo)` after signature verification. When
//! several bindings cover the same repository the first one configured
//! wins, so lookups stay deterministic.

use gitsentry_core::config::{RepoBinding, ServerConfig};

/// Lookup table over the configured repository bindings.
#[derive(Debug, Clone)]
pub struct RepoRegistry {
    bindings: Vec<RepoBinding>,
    fallback_secret: String,
}

impl RepoRegistry {
    pub fn from_config(server: &ServerConfig) -> Self {
        Self {
            bindings: server.repos.clone(),
            fallback_secret: server.webhook_secret.clone(),
        }
    }

    /// Binding for a routing token, if any binding carries it.
    pub fn by_token(&self, token: &str) -> Option<&RepoBinding> {
        self.bindings
            .iter()
            .find(|b| b.token.as_deref() == Some(token))
    }

    /// First binding registered for `(owner, repo)`.
    pub fn by_repo(&self, owner: &str, repo: &str) -> Option<&RepoBinding> {
        self.bindings
            .iter()
            .find(|b| b.owner == owner && b.repo == repo)
    }

    /// Secret to verify a delivery with: the binding's own secret when it
    /// has one, else the process-wide secret. `None` when neither exists.
    pub fn secret_for<'a>(&'a self, binding: Option<&'a RepoBinding>) -> Option<&'a str> {
        binding
            .and_then(|b| b.secret.as_deref())
            .or_else(|| (!self.fallback_secret.is_empty()).then_some(self.fallback_secret.as_str()))
    }
}

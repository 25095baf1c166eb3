//! Configuration management -- `gitsentry.toml` parsing and runtime settings.
//!
//! [`GitsentryConfig`] is the top-level structure holding every module's
//! settings.
//!
//! # Load priority
//! 1. CLI arguments (highest)
//! 2. Environment variables (`GITSENTRY_SERVER_PORT=8080` style)
//! 3. Config file (`gitsentry.toml`)
//! 4. Defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), gitsentry_core::error::GitsentryError> {
//! use gitsentry_core::config::GitsentryConfig;
//!
//! // Load from file + apply env overrides
//! let config = GitsentryConfig::load("gitsentry.toml").await?;
//!
//! // Parse directly from a TOML string
//! let config = GitsentryConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GitsentryError};

/// Unified GitSentry configuration.
///
/// Represents the top-level structure of `gitsentry.toml`. Each module
/// reads only its own section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitsentryConfig {
    /// General settings (logging, data directory)
    #[serde(default)]
    pub general: GeneralConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Scanner invocation settings
    #[serde(default)]
    pub scanners: ScannersConfig,
    /// Report store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Metrics endpoint settings
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl GitsentryConfig {
    /// Load configuration from a TOML file and apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, GitsentryError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file (no environment overrides).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, GitsentryError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitsentryError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                GitsentryError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, GitsentryError> {
        toml::from_str(toml_str).map_err(|e| {
            GitsentryError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Override configuration values from environment variables.
    ///
    /// Naming convention: `GITSENTRY_{SECTION}_{FIELD}`,
    /// e.g. `GITSENTRY_SERVER_PORT=9090`.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "GITSENTRY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "GITSENTRY_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "GITSENTRY_GENERAL_DATA_DIR");

        // Server
        override_string(&mut self.server.listen_addr, "GITSENTRY_SERVER_LISTEN_ADDR");
        override_u16(&mut self.server.port, "GITSENTRY_SERVER_PORT");
        override_string(
            &mut self.server.webhook_secret,
            "GITSENTRY_SERVER_WEBHOOK_SECRET",
        );

        // Scanners
        override_usize(
            &mut self.scanners.max_concurrent,
            "GITSENTRY_SCANNERS_MAX_CONCURRENT",
        );
        override_tool(
            &mut self.scanners.static_analysis,
            "GITSENTRY_SCANNERS_STATIC_ANALYSIS",
        );
        override_tool(
            &mut self.scanners.dependency_check,
            "GITSENTRY_SCANNERS_DEPENDENCY_CHECK",
        );
        override_tool(&mut self.scanners.secret_scan, "GITSENTRY_SCANNERS_SECRET_SCAN");
        override_tool(
            &mut self.scanners.threat_model,
            "GITSENTRY_SCANNERS_THREAT_MODEL",
        );

        // Store
        override_string(&mut self.store.data_dir, "GITSENTRY_STORE_DATA_DIR");

        // Metrics
        override_bool(&mut self.metrics.enabled, "GITSENTRY_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "GITSENTRY_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "GITSENTRY_METRICS_PORT");
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), GitsentryError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: "must be 'json' or 'pretty'".to_owned(),
            }
            .into());
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_owned(),
                reason: "must be non-zero".to_owned(),
            }
            .into());
        }

        if self.server.webhook_secret.is_empty()
            && !self.server.repos.iter().any(|r| r.secret.is_some())
        {
            return Err(ConfigError::InvalidValue {
                field: "server.webhook_secret".to_owned(),
                reason: "a process-wide secret or at least one per-repo secret is required"
                    .to_owned(),
            }
            .into());
        }

        for binding in &self.server.repos {
            if binding.owner.is_empty() || binding.repo.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "server.repos".to_owned(),
                    reason: "owner and repo must be non-empty".to_owned(),
                }
                .into());
            }
        }

        if self.scanners.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanners.max_concurrent".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        for (name, tool) in self.scanners.iter() {
            if tool.enabled {
                if tool.timeout_secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: format!("scanners.{name}.timeout_secs"),
                        reason: "must be non-zero for an enabled scanner".to_owned(),
                    }
                    .into());
                }
                if tool.max_output_bytes == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: format!("scanners.{name}.max_output_bytes"),
                        reason: "must be non-zero for an enabled scanner".to_owned(),
                    }
                    .into());
                }
            }
        }

        if self.store.data_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.data_dir".to_owned(),
                reason: "must be non-empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Base data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            data_dir: default_data_dir(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Listen port
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Process-wide webhook secret (fallback when a binding has none)
    #[serde(default)]
    pub webhook_secret: String,
    /// Registered repository bindings
    #[serde(default)]
    pub repos: Vec<RepoBinding>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_server_port(),
            webhook_secret: String::new(),
            repos: Vec::new(),
        }
    }
}

/// One registered repository: maps webhook deliveries to a user.
///
/// `token` routes deliveries sent to `/api/github/webhook/{token}`
/// directly to this binding; `secret` overrides the process-wide
/// webhook secret for deliveries resolved to this binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoBinding {
    /// Repository owner login (e.g. GitHub organization or user)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Registering user id
    pub user_id: String,
    /// Per-repository webhook secret
    #[serde(default)]
    pub secret: Option<String>,
    /// Routing token embedded in the webhook URL
    #[serde(default)]
    pub token: Option<String>,
}

/// Scanner invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannersConfig {
    /// Upper bound on simultaneously running scanner processes
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Static analysis tool (semgrep)
    #[serde(default = "ToolConfig::static_analysis_default")]
    pub static_analysis: ToolConfig,
    /// Dependency vulnerability tool (OWASP dependency-check)
    #[serde(default = "ToolConfig::dependency_check_default")]
    pub dependency_check: ToolConfig,
    /// Secret scanning tool (gitleaks)
    #[serde(default = "ToolConfig::secret_scan_default")]
    pub secret_scan: ToolConfig,
    /// Threat modeling tool
    #[serde(default = "ToolConfig::threat_model_default")]
    pub threat_model: ToolConfig,
}

impl Default for ScannersConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            static_analysis: ToolConfig::static_analysis_default(),
            dependency_check: ToolConfig::dependency_check_default(),
            secret_scan: ToolConfig::secret_scan_default(),
            threat_model: ToolConfig::threat_model_default(),
        }
    }
}

impl ScannersConfig {
    /// Iterate over (section name, tool config) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ToolConfig)> {
        [
            ("static_analysis", &self.static_analysis),
            ("dependency_check", &self.dependency_check),
            ("secret_scan", &self.secret_scan),
            ("threat_model", &self.threat_model),
        ]
        .into_iter()
    }
}

/// Settings for one external scanning tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Whether this scanner runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to the tool binary
    pub bin_path: String,
    /// Wall-clock budget for one invocation, seconds
    pub timeout_secs: u64,
    /// Captured output cap, bytes
    pub max_output_bytes: usize,
}

impl ToolConfig {
    fn static_analysis_default() -> Self {
        Self {
            enabled: true,
            bin_path: "semgrep".to_owned(),
            timeout_secs: 600,
            max_output_bytes: 200 * 1024 * 1024,
        }
    }

    fn dependency_check_default() -> Self {
        Self {
            enabled: true,
            bin_path: "dependency-check.sh".to_owned(),
            timeout_secs: 900,
            max_output_bytes: 500 * 1024 * 1024,
        }
    }

    fn secret_scan_default() -> Self {
        Self {
            enabled: true,
            bin_path: "gitleaks".to_owned(),
            timeout_secs: 300,
            max_output_bytes: 50 * 1024 * 1024,
        }
    }

    fn threat_model_default() -> Self {
        Self {
            enabled: true,
            bin_path: "threat-model".to_owned(),
            timeout_secs: 300,
            max_output_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Report store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding persisted reports
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Metrics endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether the Prometheus endpoint is exposed
    #[serde(default)]
    pub enabled: bool,
    /// Metrics listener bind address
    #[serde(default = "default_metrics_addr")]
    pub listen_addr: String,
    /// Metrics listener port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    /// Scrape endpoint path
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_addr(),
            port: default_metrics_port(),
            endpoint: default_metrics_endpoint(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "json".to_owned()
}

fn default_data_dir() -> String {
    "/var/lib/gitsentry".to_owned()
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_owned()
}

fn default_server_port() -> u16 {
    8080
}

fn default_max_concurrent() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_metrics_addr() -> String {
    "127.0.0.1".to_owned()
}

fn default_metrics_port() -> u16 {
    9184
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_owned()
}

fn override_string(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        *target = value;
    }
}

fn override_bool(target: &mut bool, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value, "ignoring unparseable bool override"),
        }
    }
}

fn override_u16(target: &mut u16, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value, "ignoring unparseable u16 override"),
        }
    }
}

fn override_u64(target: &mut u64, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value, "ignoring unparseable u64 override"),
        }
    }
}

fn override_usize(target: &mut usize, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value, "ignoring unparseable usize override"),
        }
    }
}

/// Apply the `_ENABLED`, `_BIN_PATH`, `_TIMEOUT_SECS` overrides for one tool.
fn override_tool(tool: &mut ToolConfig, prefix: &str) {
    override_bool(&mut tool.enabled, &format!("{prefix}_ENABLED"));
    override_string(&mut tool.bin_path, &format!("{prefix}_BIN_PATH"));
    override_u64(&mut tool.timeout_secs, &format!("{prefix}_TIMEOUT_SECS"));
    override_usize(
        &mut tool.max_output_bytes,
        &format!("{prefix}_MAX_OUTPUT_BYTES"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GitsentryConfig {
        let mut config = GitsentryConfig::default();
        config.server.webhook_secret = "test-secret".to_owned();
        config
    }

    #[test]
    fn defaults_validate_with_secret() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn default_without_any_secret_is_invalid() {
        let config = GitsentryConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn per_repo_secret_satisfies_secret_requirement() {
        let mut config = GitsentryConfig::default();
        config.server.repos.push(RepoBinding {
            owner: "octocat".to_owned(),
            repo: "hello-world".to_owned(),
            user_id: "u1".to_owned(),
            secret: Some("repo-secret".to_owned()),
            token: None,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_toml_sections() {
        let config = GitsentryConfig::parse(
            r#"
            [general]
            log_level = "debug"
            log_format = "pretty"

            [server]
            port = 9000
            webhook_secret = "s3cret"

            [[server.repos]]
            owner = "octocat"
            repo = "hello-world"
            user_id = "u1"
            token = "tok-abc"

            [scanners]
            max_concurrent = 2

            [scanners.secret_scan]
            bin_path = "/usr/local/bin/gitleaks"
            timeout_secs = 120
            max_output_bytes = 1048576
            "#,
        )
        .expect("parse");

        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.scanners.max_concurrent, 2);
        assert_eq!(config.scanners.secret_scan.bin_path, "/usr/local/bin/gitleaks");
        assert_eq!(config.server.repos[0].token.as_deref(), Some("tok-abc"));
        // Untouched sections keep defaults
        assert_eq!(config.scanners.static_analysis.timeout_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_log_level() {
        let mut config = valid_config();
        config.general.log_level = "verbose".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_max_concurrent() {
        let mut config = valid_config();
        config.scanners.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout_on_enabled_tool() {
        let mut config = valid_config();
        config.scanners.threat_model.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_tool_may_have_zero_timeout() {
        let mut config = valid_config();
        config.scanners.threat_model.enabled = false;
        config.scanners.threat_model.timeout_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial_test::serial]
    fn env_override_applies() {
        let mut config = valid_config();
        // Safety: test is serialized; no other thread reads the environment.
        unsafe {
            std::env::set_var("GITSENTRY_SERVER_PORT", "9999");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("GITSENTRY_SERVER_PORT");
        }
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    #[serial_test::serial]
    fn env_override_ignores_garbage() {
        let mut config = valid_config();
        unsafe {
            std::env::set_var("GITSENTRY_SERVER_PORT", "not-a-port");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("GITSENTRY_SERVER_PORT");
        }
        assert_eq!(config.server.port, 8080);
    }
}

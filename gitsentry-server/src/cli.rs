//! CLI argument definitions for gitsentry-server.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// GitSentry webhook-driven security scanning server.
///
/// Receives GitHub push webhooks, fans deliveries out to the configured
/// scanners, persists aggregate reports, and serves them (including PDF
/// rendering) over HTTP.
#[derive(Parser, Debug)]
#[command(name = "gitsentry-server")]
#[command(version, about, long_about = None)]
pub struct ServerCli {
    /// Path to gitsentry.toml configuration file.
    #[arg(short, long, default_value = "/etc/gitsentry/gitsentry.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

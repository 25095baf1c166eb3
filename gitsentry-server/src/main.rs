use anyhow::Result;
use clap::Parser;

use gitsentry_core::config::GitsentryConfig;
use gitsentry_server::cli::ServerCli;
use gitsentry_server::handlers::{self, AppState};
use gitsentry_server::{logging, metrics_server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ServerCli::parse();

    let mut config = GitsentryConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;

    // CLI overrides take precedence over file and environment.
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "gitsentry-server starting");

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
        tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
    }

    let state = AppState::from_config(&config);
    let app = handlers::router(state);

    let addr = format!("{}:{}", config.server.listen_addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;
    tracing::info!(listen_addr = %addr, "gitsentry-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gitsentry-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    } else {
        tracing::info!("shutdown signal received");
    }
}

//! Magpie search server binary.
//!
//! Loads configuration from the default path (or `MAGPIE_CONFIG`),
//! overlays credential environment variables, and serves the JSON API
//! until interrupted.

use std::path::PathBuf;

use magpie::config::AppConfig;
use magpie::server::{ApiServer, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("magpie=info,magpie_search=info")),
        )
        .init();

    let config_path = std::env::var("MAGPIE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| AppConfig::default_config_path());

    let mut config = AppConfig::load_or_default(&config_path)?;
    config.apply_env_overrides();
    config.validate()?;

    tracing::info!(config = %config_path.display(), "magpie-server starting");

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::new(config, config_path)?;
    let server = ApiServer::start(state, &host, port).await?;

    tracing::info!(addr = %server.addr(), "ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown();
    Ok(())
}

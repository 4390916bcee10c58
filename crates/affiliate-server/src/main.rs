//! Directory server binary.
//!
//! Wires configuration, logging, the store, and the HTTP API together.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `affiliate-config.yaml` (or `AFFILIATE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the directory: in-memory when `database.url` is `memory`,
//!    otherwise `PostgreSQL` with migrations when enabled
//! 4. Serve the API until `Ctrl-C`
//! 5. Close the store

mod error;

use std::sync::Arc;

use affiliate_api::{AppState, start_server};
use affiliate_core::config::LoggingConfig;
use affiliate_core::{AppConfig, ConfigSource};
use affiliate_db::{Directory, PostgresConfig, PostgresPool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// `database.url` value selecting the in-memory directory.
const MEMORY_URL: &str = "memory";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the server fails.
#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Load configuration.
    let (config, source) = AppConfig::load()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("affiliate-server starting");
    match &source {
        ConfigSource::File(path) => info!(path = %path.display(), "config file read"),
        ConfigSource::Defaults(path) => {
            warn!(path = %path.display(), "config file not found, using defaults");
        }
    }
    info!(
        host = %config.server.host,
        port = config.server.port,
        admin_enabled = config.admin.is_enabled(),
        geo_enabled = config.geo.enabled,
        "Configuration loaded"
    );
    if !config.admin.is_enabled() {
        warn!("admin.token is empty, admin API disabled");
    }

    // 3. Open the directory.
    let directory = open_directory(&config).await?;
    info!(backend = directory.backend(), "Directory opened");

    // 4. Serve.
    let state = Arc::new(AppState::new(directory.clone(), config.clone())?);
    start_server(&config.server, state, shutdown_signal()).await?;

    // 5. Close the store.
    directory.close().await;
    info!("affiliate-server shutdown complete");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_directory(config: &AppConfig) -> Result<Directory, StartupError> {
    if is_memory_url(&config.database.url) {
        warn!("using the in-memory directory; data is lost on restart");
        return Ok(Directory::memory());
    }
    let pool = PostgresPool::connect(&PostgresConfig::from_app_config(&config.database)).await?;
    if config.database.run_migrations {
        pool.run_migrations().await?;
        info!("Migrations applied");
    }
    Ok(Directory::Postgres(pool))
}

fn is_memory_url(url: &str) -> bool {
    url.trim().eq_ignore_ascii_case(MEMORY_URL)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn memory_url_selects_in_memory_directory() {
        assert!(is_memory_url("memory"));
        assert!(is_memory_url(" MEMORY "));
        assert!(!is_memory_url("postgresql://localhost/affiliate"));
    }

    #[tokio::test]
    async fn open_directory_in_memory() {
        let mut config = AppConfig::default();
        config.database.url = MEMORY_URL.to_owned();
        let directory = open_directory(&config).await.unwrap();
        assert_eq!(directory.backend(), "memory");
    }
}

//! Click tracker entry point.
//!
//! Loads configuration from the environment, opens the click file, and
//! serves the tracker routes until `Ctrl-C`.

use std::net::SocketAddr;
use std::sync::Arc;

use affiliate_tracker::{ClickFile, TrackerConfig, build_router};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the listener cannot
/// bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = TrackerConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        data_file = %config.data_file.display(),
        "configuration loaded"
    );

    let store = Arc::new(ClickFile::new(config.data_file.clone()));
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "click tracker listening");

    axum::serve(listener, build_router(store))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    info!("click tracker stopped");
    Ok(())
}

//! Listener lifecycle for the directory API.
//!
//! The router is served with connect info so the click logger can fall back
//! to the socket peer address when no forwarding header is present.

use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use affiliate_core::config::ServerConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Bind `server.host:server.port` and serve until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after `shutdown` fires.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listen_addr(config)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "directory API listening");

    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("directory API stopped");
    Ok(())
}

fn listen_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
    let raw = format!("{}:{}", config.host.trim(), config.port);
    raw.parse()
        .map_err(|source| ServerError::InvalidAddress { addr: raw, source })
}

/// Failure to start or keep serving the API.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `server.host` and `server.port` do not form a socket address.
    #[error("invalid listen address {addr}: {source}")]
    InvalidAddress {
        /// The rejected `host:port` string.
        addr: String,
        /// Parser error.
        source: AddrParseError,
    },

    /// The address is taken or not permitted.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// The address we tried to bind.
        addr: SocketAddr,
        /// OS error.
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("serve error: {0}")]
    Serve(#[from] std::io::Error),
}

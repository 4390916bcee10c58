//! Error types for the directory server binary.
//!
//! [`StartupError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the directory server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: affiliate_core::ConfigError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying store error.
        #[from]
        source: affiliate_db::DbError,
    },

    /// The geo lookup client could not be built.
    #[error("geo lookup error: {source}")]
    Geo {
        /// The underlying client error.
        #[from]
        source: affiliate_api::geo::GeoError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: affiliate_api::ServerError,
    },
}

//! Shared application state for the directory API.
//!
//! [`AppState`] is wrapped in an `Arc` and handed to every handler. It
//! holds the store handle, the loaded configuration, and the geo lookup
//! used by the click logger.

use affiliate_core::AppConfig;
use affiliate_db::Directory;

use crate::geo::{GeoError, GeoLookup};

/// Shared state accessible to all API handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Backend-agnostic store handle.
    pub directory: Directory,
    /// Loaded configuration.
    pub config: AppConfig,
    /// Country lookup for clicks.
    pub geo: GeoLookup,
}

impl AppState {
    /// Build state with the geo lookup described by `config.geo`.
    pub fn new(directory: Directory, config: AppConfig) -> Result<Self, GeoError> {
        let geo = GeoLookup::from_config(&config.geo)?;
        Ok(Self {
            directory,
            config,
            geo,
        })
    }

    /// Replace the geo lookup.
    #[must_use]
    pub fn with_geo(mut self, geo: GeoLookup) -> Self {
        self.geo = geo;
        self
    }
}

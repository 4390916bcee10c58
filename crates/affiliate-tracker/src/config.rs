//! Configuration for the click tracker.
//!
//! All configuration is loaded from environment variables; every variable
//! has a default so the tracker starts with no setup.

use std::path::PathBuf;

use crate::error::TrackerError;

/// Tracker configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// JSON array file holding every recorded click.
    pub data_file: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 3001,
            data_file: PathBuf::from("data/custom_clicks.json"),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `TRACKER_HOST` -- bind address (default `0.0.0.0`)
    /// - `TRACKER_PORT` -- bind port (default `3001`)
    /// - `TRACKER_DATA_FILE` -- click file (default `data/custom_clicks.json`)
    pub fn from_env() -> Result<Self, TrackerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrackerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = lookup("TRACKER_HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_owned();
        }
        if let Some(port) = lookup("TRACKER_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| TrackerError::Config(format!("invalid TRACKER_PORT: {e}")))?;
        }
        if let Some(path) = lookup("TRACKER_DATA_FILE").filter(|p| !p.trim().is_empty()) {
            config.data_file = PathBuf::from(path.trim());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = TrackerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn variables_override_defaults() {
        let config = TrackerConfig::from_lookup(|name| match name {
            "TRACKER_HOST" => Some("127.0.0.1".to_owned()),
            "TRACKER_PORT" => Some("4100".to_owned()),
            "TRACKER_DATA_FILE" => Some("/tmp/clicks.json".to_owned()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4100);
        assert_eq!(config.data_file, PathBuf::from("/tmp/clicks.json"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let result = TrackerConfig::from_lookup(|name| {
            (name == "TRACKER_PORT").then(|| "eighty".to_owned())
        });
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }
}

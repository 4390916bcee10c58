//! Country lookup for click logging.
//!
//! Lookups are best-effort: a private address, a slow service, or an
//! unexpected body all yield `None`, and the click is stored without a
//! country.

use std::net::IpAddr;
use std::time::Duration;

use affiliate_core::config::GeoConfig;
use tracing::debug;

/// Errors building a [`GeoLookup`].
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// The HTTP client could not be constructed.
    #[error("failed to build geo HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Resolves a caller IP to a country name.
#[derive(Debug, Clone)]
pub enum GeoLookup {
    /// No lookups; every click is stored without a country.
    Disabled,
    /// Always answer with the same country. Used by tests and local runs.
    Fixed(String),
    /// Query `{base_url}/{ip}/json` on an ipapi-compatible service.
    Http {
        /// Shared client carrying the lookup timeout.
        client: reqwest::Client,
        /// Service root without a trailing slash.
        base_url: String,
    },
}

impl GeoLookup {
    /// Build the lookup described by `config`.
    pub fn from_config(config: &GeoConfig) -> Result<Self, GeoError> {
        if !config.enabled || config.base_url.trim().is_empty() {
            return Ok(Self::Disabled);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self::Http {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Country for `ip`, or `None` when it cannot be determined.
    pub async fn country(&self, ip: IpAddr) -> Option<String> {
        if !is_routable(ip) {
            return None;
        }
        match self {
            Self::Disabled => None,
            Self::Fixed(country) => Some(country.clone()),
            Self::Http { client, base_url } => lookup(client, base_url, ip).await,
        }
    }
}

async fn lookup(client: &reqwest::Client, base_url: &str, ip: IpAddr) -> Option<String> {
    let url = format!("{base_url}/{ip}/json");
    let response = match client.get(&url).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            debug!(%ip, status = %r.status(), "geo lookup rejected");
            return None;
        }
        Err(e) => {
            debug!(%ip, error = %e, "geo lookup failed");
            return None;
        }
    };
    match response.json::<serde_json::Value>().await {
        Ok(body) => country_from_body(&body),
        Err(e) => {
            debug!(%ip, error = %e, "geo lookup returned an unreadable body");
            None
        }
    }
}

/// Pull the country name out of an ipapi-style response.
fn country_from_body(body: &serde_json::Value) -> Option<String> {
    if body.get("error").and_then(serde_json::Value::as_bool) == Some(true) {
        return None;
    }
    ["country_name", "country"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(serde_json::Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Return false for addresses no lookup service can place.
pub fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_routable(IpAddr::V4(mapped));
            }
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local())
        }
    }
}

//! Public REST endpoint handlers.
//!
//! These back the visitor-facing directory pages. Nothing here needs a
//! token; writes are limited to join requests and click logging.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness + store ping |
//! | `GET` | `/api/networks` | Filtered network listing |
//! | `GET` | `/api/networks/{id}` | Network + its active offers |
//! | `GET` | `/api/offers` | Filtered offer listing, active by default |
//! | `GET` | `/api/offers/{id}` | Single offer with countdown |
//! | `GET` | `/api/placements` | Banners and rotations per layout section |
//! | `GET` | `/api/master-data` | Pick-lists grouped by category |
//! | `POST` | `/api/network-requests` | Submit a join request |
//! | `POST` | `/api/clicks` | Log a banner click |

use std::collections::BTreeMap;
use std::sync::Arc;

use affiliate_core::browse::{self, NetworkQuery, OfferQuery};
use affiliate_core::validation;
use affiliate_core::{WithCountdown, assign_sections};
use affiliate_types::{
    BannerId, MasterDataCategory, NetworkId, NetworkRequestDraft, NewBannerClick, Offer, OfferId,
    OfferStatus,
};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ApiError, parse_uuid};
use crate::extract::{ApiJson, ApiQuery, ClientIp, user_agent};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/clicks`.
#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    /// The clicked banner.
    pub banner_id: String,
    /// Visitor id, when the site knows one.
    #[serde(default)]
    pub user_id: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness after pinging the store.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.directory.ping().await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "backend": state.directory.backend(),
    })))
}

// ---------------------------------------------------------------------------
// Networks and offers
// ---------------------------------------------------------------------------

/// List networks matching the query.
pub async fn list_networks(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<NetworkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let networks = state.directory.list_networks().await?;
    let page = browse::filter_networks(networks, &query)?;
    Ok(Json(page))
}

/// A network with its active offers.
pub async fn get_network(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: NetworkId = parse_uuid(&id_str)?;
    let network = state
        .directory
        .get_network(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("network {id}")))?;

    let now = Utc::now();
    let offers: Vec<WithCountdown<Offer>> = state
        .directory
        .list_offers_for_network(id)
        .await?
        .into_iter()
        .filter(|o| o.status == OfferStatus::Active)
        .map(|o| {
            let expires_at = o.expires_at;
            WithCountdown::new(o, expires_at, now)
        })
        .collect();

    Ok(Json(serde_json::json!({
        "network": network,
        "offers": offers,
    })))
}

/// List offers matching the query; active only unless `status` is given.
pub async fn list_offers(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<OfferQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let offers = state.directory.list_offers().await?;
    let now = Utc::now();
    let page = browse::filter_offers(offers, &query, Some(OfferStatus::Active))?.map(|o| {
        let expires_at = o.expires_at;
        WithCountdown::new(o, expires_at, now)
    });
    Ok(Json(page))
}

/// A single offer with its countdown.
pub async fn get_offer(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: OfferId = parse_uuid(&id_str)?;
    let offer = state
        .directory
        .get_offer(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("offer {id}")))?;
    let expires_at = offer.expires_at;
    Ok(Json(WithCountdown::new(offer, expires_at, Utc::now())))
}

// ---------------------------------------------------------------------------
// GET /api/placements
// ---------------------------------------------------------------------------

/// What renders in each layout section right now.
pub async fn placements(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let banners = state.directory.list_banners().await?;
    let rotations = state.directory.list_rotations().await?;
    let placement = assign_sections(&banners, &rotations, Utc::now());
    Ok(Json(placement))
}

// ---------------------------------------------------------------------------
// GET /api/master-data
// ---------------------------------------------------------------------------

/// Every pick-list, keyed by category. Empty categories are included.
pub async fn master_data(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let entries = state.directory.list_master_data(None).await?;
    let mut grouped: BTreeMap<&'static str, Vec<String>> = MasterDataCategory::ALL
        .iter()
        .map(|c| (c.as_str(), Vec::new()))
        .collect();
    for entry in entries {
        grouped
            .entry(entry.category.as_str())
            .or_default()
            .push(entry.value);
    }
    Ok(Json(grouped))
}

// ---------------------------------------------------------------------------
// POST /api/network-requests
// ---------------------------------------------------------------------------

/// Accept a join request from a network.
pub async fn submit_network_request(
    State(state): State<Arc<AppState>>,
    ApiJson(mut draft): ApiJson<NetworkRequestDraft>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_network_request(&mut draft)?;
    let request = state.directory.create_request(&draft).await?;
    info!(request_id = %request.id, network = %request.network_name, "network request received");
    Ok((StatusCode::CREATED, Json(request)))
}

// ---------------------------------------------------------------------------
// POST /api/clicks
// ---------------------------------------------------------------------------

/// Record a banner click with the caller's IP, country, and user agent.
pub async fn record_click(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ClickRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let banner_id: BannerId = parse_uuid(&body.banner_id)?;
    if state.directory.get_banner(banner_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("banner {banner_id}")));
    }

    let country = match ip {
        Some(addr) => state.geo.country(addr).await,
        None => None,
    };
    let click = NewBannerClick {
        banner_id,
        user_id: body.user_id.map(|u| u.trim().to_owned()).filter(|u| !u.is_empty()),
        ip_address: ip.map(|addr| addr.to_string()),
        country,
        user_agent: user_agent(&headers),
    };
    let stored = state.directory.record_click(&click).await?;
    debug!(banner_id = %banner_id, click_id = %stored.id, "click recorded");
    Ok((StatusCode::CREATED, Json(stored)))
}

//! Click analytics endpoints under `/api/admin/analytics`.

use std::sync::Arc;

use affiliate_core::analytics::{self, ClickFilter};
use affiliate_types::BannerId;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ApiError, parse_uuid};
use crate::extract::ApiQuery;
use crate::state::AppState;

/// Query parameters for `GET /api/admin/analytics/clicks`.
#[derive(Debug, Deserialize)]
pub struct ClicksQuery {
    /// Inclusive lower bound (RFC 3339).
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound (RFC 3339).
    pub until: Option<DateTime<Utc>>,
    /// Only clicks on this banner.
    pub banner_id: Option<String>,
    /// Maximum number of rows (default 100, max 1000).
    pub limit: Option<usize>,
}

/// Query parameters for `GET /api/admin/analytics/summary`.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    /// Inclusive lower bound (RFC 3339).
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound (RFC 3339).
    pub until: Option<DateTime<Utc>>,
}

fn check_window(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Result<(), ApiError> {
    if let (Some(s), Some(u)) = (since, until)
        && s >= u
    {
        return Err(ApiError::InvalidQuery(String::from("since must be before until")));
    }
    Ok(())
}

/// Raw clicks, newest first.
pub async fn clicks(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ClicksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_window(params.since, params.until)?;
    let banner_id: Option<BannerId> = params.banner_id.as_deref().map(parse_uuid).transpose()?;
    let filter = ClickFilter {
        since: params.since,
        until: params.until,
        banner_id,
        limit: params.limit,
    };
    Ok(Json(state.directory.list_clicks(&filter).await?))
}

/// One row per banner, most clicked first.
pub async fn banners(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let banners = state.directory.list_banners().await?;
    let counts = state.directory.click_counts().await?;
    Ok(Json(analytics::banner_table(&banners, &counts)))
}

/// Click summary for a window.
pub async fn summary(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_window(params.since, params.until)?;
    let clicks = state
        .directory
        .clicks_between(params.since, params.until)
        .await?;
    Ok(Json(analytics::summarize(&clicks)))
}

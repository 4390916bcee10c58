//! Tracker endpoint handlers.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/custom-click` | Append a click |
//! | `GET` | `/api/custom-clicks` | Every stored click |

use std::sync::Arc;

use affiliate_types::CustomClick;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::TrackerError;
use crate::store::ClickFile;

/// Body of `POST /api/custom-click`.
#[derive(Debug, Default, Deserialize)]
pub struct CustomClickRequest {
    /// Clicked banner. Strings and numbers are both accepted.
    #[serde(default)]
    pub banner_id: Option<Value>,
    /// Overrides the request's `User-Agent` header.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Append a click to the file.
pub async fn record_click(
    State(store): State<Arc<ClickFile>>,
    headers: HeaderMap,
    body: Result<Json<CustomClickRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackerError> {
    let Json(body) = body.map_err(|e| body_rejection(&e))?;
    let banner_id = body
        .banner_id
        .as_ref()
        .and_then(banner_text)
        .ok_or_else(|| TrackerError::BadRequest(String::from("banner_id is required")))?;

    let user_agent = body.user_agent.or_else(|| {
        headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    });

    let click = CustomClick {
        id: Uuid::now_v7(),
        banner_id,
        user_agent,
        timestamp: Utc::now(),
    };
    let stored = store.append(click).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Every stored click.
pub async fn list_clicks(
    State(store): State<Arc<ClickFile>>,
) -> Result<impl IntoResponse, TrackerError> {
    Ok(Json(store.all().await?))
}

/// An unparsed body carries no `banner_id`; a malformed one says why.
fn body_rejection(rejection: &JsonRejection) -> TrackerError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            TrackerError::BadRequest(String::from("banner_id is required"))
        }
        other => TrackerError::BadRequest(other.body_text()),
    }
}

fn banner_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//! `WebSocket` handler for rotation streaming.
//!
//! Clients connect to `GET /ws/rotations/{id}` and receive a JSON-encoded
//! [`RotationFrame`] immediately and then once per display interval. Each
//! connection owns its own [`RotationTicker`], so clients are not kept in
//! step with one another. When the rotation expires mid-stream the server
//! sends `{"expired": true}` and closes.

use std::sync::Arc;
use std::time::Duration;

use affiliate_core::placement::is_rotation_active;
use affiliate_core::{RotationFrame, RotationTicker};
use affiliate_types::{BannerRotation, RotationId};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{ApiError, parse_uuid};
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection streaming the
/// frames of one rotation.
///
/// # Route
///
/// `GET /ws/rotations/{id}`
pub async fn ws_rotation(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: RotationId = parse_uuid(&id_str)?;
    let rotation = state
        .directory
        .get_rotation(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("rotation {id}")))?;
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, rotation)))
}

/// Handle the `WebSocket` lifecycle for one rotation.
async fn handle_ws(mut socket: WebSocket, rotation: BannerRotation) {
    debug!(rotation_id = %rotation.id, "rotation stream connected");

    let now = Utc::now();
    if !is_rotation_active(&rotation, now) {
        send_expired(&mut socket).await;
        return;
    }

    let mut ticker = match RotationTicker::for_rotation(&rotation) {
        Ok(t) => t,
        Err(e) => {
            warn!(rotation_id = %rotation.id, error = %e, "rotation cannot be streamed");
            let body = serde_json::json!({"error": e.to_string()}).to_string();
            let _ = socket.send(Message::Text(body.into())).await;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    // `None` when the rotation never expires; the expiry branch is then
    // disabled.
    let remaining = rotation
        .expires_at
        .map(|at| at.signed_duration_since(now).to_std().unwrap_or(Duration::ZERO));
    let expiry = tokio::time::sleep(remaining.unwrap_or(Duration::ZERO));
    tokio::pin!(expiry);

    if !send_frame(&mut socket, &rotation, ticker.current()).await {
        return;
    }

    loop {
        tokio::select! {
            index = ticker.changed() => {
                match index {
                    Ok(index) => {
                        if !send_frame(&mut socket, &rotation, index).await {
                            return;
                        }
                    }
                    Err(e) => {
                        debug!(rotation_id = %rotation.id, error = %e, "ticker stopped");
                        return;
                    }
                }
            }
            () = &mut expiry, if remaining.is_some() => {
                debug!(rotation_id = %rotation.id, "rotation expired while streaming");
                send_expired(&mut socket).await;
                return;
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("rotation stream client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("rotation stream client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Send the frame at `index`. Returns false once the client is gone.
async fn send_frame(socket: &mut WebSocket, rotation: &BannerRotation, index: usize) -> bool {
    let Some(frame) = RotationFrame::at(rotation, index) else {
        warn!(rotation_id = %rotation.id, index, "rotation index out of range");
        return true;
    };
    let json = match serde_json::to_string(&frame) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize rotation frame: {e}");
            return true;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("rotation stream client disconnected (send failed)");
        return false;
    }
    true
}

async fn send_expired(socket: &mut WebSocket) {
    let body = serde_json::json!({"expired": true}).to_string();
    if socket.send(Message::Text(body.into())).await.is_ok() {
        let _ = socket.send(Message::Close(None)).await;
    }
}

//! Error types for the click tracker.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Errors that can occur in the click tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The request body was unusable.
    #[error("{0}")]
    BadRequest(String),

    /// Reading or writing the click file failed.
    #[error("click file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the click file failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Io(_) | Self::Serialization(_) | Self::Config(_) => {
                error!(error = %self, "click tracker failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("failed to store click"),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

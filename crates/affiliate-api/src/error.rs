//! Error types for the directory API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! body has the shape `{"error": ..., "status": ...}`; validation failures
//! add a `fields` map.

use affiliate_core::ValidationError;
use affiliate_core::browse::BrowseError;
use affiliate_core::import::ImportError;
use affiliate_db::DbError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A UUID could not be parsed from the request path or query.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The request body was not JSON the endpoint can read.
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// A submitted draft failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request carried no valid admin token.
    #[error("unauthorized")]
    Unauthorized,

    /// No admin token is configured, so the admin API is off.
    #[error("admin API disabled")]
    AdminDisabled,

    /// The write collides with an existing row.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write references a row that does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// An import request was rejected as a whole.
    #[error("import rejected: {0}")]
    Import(#[from] ImportError),

    /// The data layer failed.
    #[error("store error: {0}")]
    Store(DbError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => Self::Conflict(msg),
            DbError::MissingReference(msg) => Self::MissingReference(msg),
            other => Self::Store(other),
        }
    }
}

impl From<BrowseError> for ApiError {
    fn from(err: BrowseError) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidQuery(msg) | Self::InvalidUuid(msg) | Self::MalformedBody(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::AdminDisabled => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::MissingReference(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::Import(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Self::Store(e) => {
                error!(error = %e, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("internal storage error"),
                )
            }
            Self::Internal(msg) => {
                error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let mut body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });
        if let Self::Validation(v) = &self
            && let Some(obj) = body.as_object_mut()
        {
            obj.insert(
                String::from("fields"),
                serde_json::to_value(&v.fields).unwrap_or_default(),
            );
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Parse a path or query segment as a UUID.
pub(crate) fn parse_uuid<T: From<uuid::Uuid>>(s: &str) -> Result<T, ApiError> {
    s.trim()
        .parse::<uuid::Uuid>()
        .map(T::from)
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn db_constraint_errors_keep_their_meaning() {
        let conflict: ApiError = DbError::Conflict("tag already exists".into()).into();
        assert!(matches!(conflict, ApiError::Conflict(_)));
        let missing: ApiError = DbError::MissingReference("offer".into()).into();
        assert!(matches!(missing, ApiError::MissingReference(_)));
        let corrupt: ApiError = DbError::corrupt("offers", "bad status").into();
        assert!(matches!(corrupt, ApiError::Store(_)));
    }

    #[test]
    fn validation_maps_to_422() {
        let mut v = ValidationError::default();
        v.add("name", "name must be 1-200 characters");
        let response = ApiError::from(v).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn parse_uuid_rejects_garbage() {
        let err = parse_uuid::<affiliate_types::OfferId>("nope").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUuid(_)));
        let ok: affiliate_types::OfferId =
            parse_uuid(" 0191e0a4-7b1c-7c3e-8f1a-3a5b6c7d8e9f ").unwrap();
        assert_eq!(ok.to_string(), "0191e0a4-7b1c-7c3e-8f1a-3a5b6c7d8e9f");
    }
}

//! Bearer-token guard for the admin API.
//!
//! [`require_admin`] runs in front of every `/api/admin` route. It rejects
//! requests with `503` when no token is configured and `401` when the
//! token is missing or wrong. Accepted requests carry an [`Actor`]
//! extension naming who made the change, for the audit log.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Header naming the admin user behind a request.
pub const ACTOR_HEADER: &str = "x-admin-user";

/// The admin responsible for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    /// Borrow the actor name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Middleware enforcing the admin bearer token.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let admin = &state.config.admin;
    if !admin.is_enabled() {
        return Err(ApiError::AdminDisabled);
    }

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    let authorized = presented.is_some_and(|token| tokens_match(token, admin.token.trim()));
    if !authorized {
        debug!(path = %request.uri().path(), "admin request rejected");
        return Err(ApiError::Unauthorized);
    }

    let actor = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| admin.identity.clone(), str::to_owned);
    request.extensions_mut().insert(Actor(actor));

    Ok(next.run(request).await)
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3cret", "s3cre"));
        assert!(!tokens_match("s3creT", "s3cret"));
        assert!(!tokens_match("", "s3cret"));
    }
}

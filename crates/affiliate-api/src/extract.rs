//! Request extractors shared by the public and admin handlers.
//!
//! [`ApiJson`] and [`ApiQuery`] wrap axum's own extractors so that a body
//! or query string that fails to deserialize answers with the same JSON
//! error shape as every other [`ApiError`].

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use affiliate_core::ValidationError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Query, Request};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor whose rejection is an [`ApiError`].
///
/// A body that parses but does not fit the target type is a 422 keyed by
/// the top-level field serde stopped at. Anything else (no JSON content
/// type, syntax errors) is a 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

/// Query string extractor whose rejection is [`ApiError::InvalidQuery`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| ApiError::InvalidQuery(rejection.body_text()))
    }
}

fn json_rejection(rejection: &JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            let (field, message) = data_error_field(&e.body_text());
            let mut errors = ValidationError::default();
            errors.add(&field, message);
            ApiError::Validation(errors)
        }
        other => ApiError::MalformedBody(other.body_text()),
    }
}

/// Split axum's data-error text into `(field, message)`.
///
/// The text reads `<prefix>: <path>: <message> at line L column C`, where
/// the path is omitted for errors at the document root.
fn data_error_field(text: &str) -> (String, String) {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    let detail = detail
        .rsplit_once(" at line ")
        .map_or(detail, |(message, _)| message);

    if let Some((path, message)) = detail.split_once(": ")
        && !path.is_empty()
        && !path.contains(char::is_whitespace)
    {
        let field = path.split(['.', '[']).next().unwrap_or(path);
        if !field.is_empty() {
            return (field.to_owned(), message.to_owned());
        }
    }

    let missing = detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name.to_owned());
    (
        missing.unwrap_or_else(|| String::from("body")),
        detail.to_owned(),
    )
}

/// The caller's address.
///
/// Taken from the first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// the socket peer. `None` when none of them parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(Self(forwarded_ip(&parts.headers).or(peer)))
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());
    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    })
}

/// The caller's `User-Agent`, if it sent one.
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("8.8.8.8, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("1.1.1.1"));
        assert_eq!(forwarded_ip(&headers), Some("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn real_ip_used_when_forwarded_for_is_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        headers.insert("x-real-ip", HeaderValue::from_static(" 1.1.1.1 "));
        assert_eq!(forwarded_ip(&headers), Some("1.1.1.1".parse().unwrap()));
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn data_error_names_the_top_level_field() {
        let (field, message) = data_error_field(
            "Failed to deserialize the JSON body into the target type: \
             sections[0]: unknown section `header` at line 1 column 48",
        );
        assert_eq!(field, "sections");
        assert_eq!(message, "unknown section `header`");
    }

    #[test]
    fn data_error_at_root_uses_missing_field_name() {
        let (field, message) = data_error_field(
            "Failed to deserialize the JSON body into the target type: \
             missing field `image_url` at line 1 column 2",
        );
        assert_eq!(field, "image_url");
        assert_eq!(message, "missing field `image_url`");

        let (field, _) = data_error_field(
            "Failed to deserialize the JSON body into the target type: \
             invalid type: integer `3`, expected a map at line 1 column 1",
        );
        assert_eq!(field, "body");
    }

    #[test]
    fn blank_user_agent_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_agent(&headers), None);
        headers.insert(USER_AGENT, HeaderValue::from_static("  "));
        assert_eq!(user_agent(&headers), None);
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        assert_eq!(user_agent(&headers).as_deref(), Some("curl/8.0"));
    }
}

//! Integration tests for the click tracker endpoints.
//!
//! Tests drive the `Router` via `tower::ServiceExt` against a click file
//! in a temporary directory.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use affiliate_tracker::{ClickFile, build_router};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_click(store: &Arc<ClickFile>, body: &Value, user_agent: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/custom-click")
        .header("content-type", "application/json");
    if let Some(ua) = user_agent {
        builder = builder.header("user-agent", ua);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    let response = build_router(Arc::clone(store)).oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn list(store: &Arc<ClickFile>) -> Value {
    let request = Request::builder()
        .uri("/api/custom-clicks")
        .body(Body::empty())
        .unwrap();
    let response = build_router(Arc::clone(store)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_to_json(response.into_body()).await
}

#[tokio::test]
async fn test_list_without_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ClickFile::new(dir.path().join("clicks.json")));
    assert_eq!(list(&store).await, json!([]));
}

#[tokio::test]
async fn test_click_is_recorded_with_header_user_agent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clicks.json");
    let store = Arc::new(ClickFile::new(&path));

    let (status, click) = post_click(&store, &json!({"banner_id": "summer-1"}), Some("agent/2.0")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(click["banner_id"], "summer-1");
    assert_eq!(click["user_agent"], "agent/2.0");
    assert!(click["id"].is_string());
    assert!(click["timestamp"].is_string());

    let (status, click) = post_click(
        &store,
        &json!({"banner_id": 42, "user_agent": "from-body"}),
        Some("agent/2.0"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(click["banner_id"], "42");
    assert_eq!(click["user_agent"], "from-body");

    let all = list(&store).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all[0]["banner_id"], "summer-1");

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, all);
}

#[tokio::test]
async fn test_missing_banner_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ClickFile::new(dir.path().join("clicks.json")));

    for body in [json!({}), json!({"banner_id": "  "}), json!({"banner_id": null})] {
        let (status, error) = post_click(&store, &body, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error["error"], "banner_id is required");
    }
    assert_eq!(list(&store).await, json!([]));
}

#[tokio::test]
async fn test_unparsed_body_gets_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ClickFile::new(dir.path().join("clicks.json")));

    let request = Request::builder()
        .method("POST")
        .uri("/api/custom-click")
        .body(Body::from(r#"{"banner_id":"b"}"#))
        .unwrap();
    let response = build_router(Arc::clone(&store)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_to_json(response.into_body()).await;
    assert_eq!(error["error"], "banner_id is required");
    assert_eq!(error["status"], 400);

    let request = Request::builder()
        .method("POST")
        .uri("/api/custom-click")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = build_router(Arc::clone(&store)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_to_json(response.into_body()).await;
    assert!(error["error"].is_string());

    assert_eq!(list(&store).await, json!([]));
}

#[tokio::test]
async fn test_corrupt_file_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clicks.json");
    std::fs::write(&path, "[{\"oops\"").unwrap();
    let store = Arc::new(ClickFile::new(&path));

    let (status, _) = post_click(&store, &json!({"banner_id": "b"}), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list(&store).await.as_array().unwrap().len(), 1);
}

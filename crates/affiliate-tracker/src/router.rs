//! Axum router for the click tracker.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::store::ClickFile;

/// Build the tracker router over `store`.
///
/// CORS allows any origin; the tracker is called from banner pages on
/// other hosts.
pub fn build_router(store: Arc<ClickFile>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/custom-click", post(handlers::record_click))
        .route("/api/custom-clicks", get(handlers::list_clicks))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

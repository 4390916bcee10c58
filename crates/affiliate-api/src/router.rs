//! Axum router construction for the directory API.
//!
//! Assembles the public routes, the `WebSocket` rotation stream, and the
//! token-guarded admin routes into a single [`Router`] with CORS enabled
//! for the browser front end.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{admin, analytics, auth, handlers, ws};

/// Build the complete Axum router.
///
/// Public routes:
/// - `GET /health`
/// - `GET /api/networks`, `GET /api/networks/{id}`
/// - `GET /api/offers`, `GET /api/offers/{id}`
/// - `GET /api/placements`
/// - `GET /api/master-data`
/// - `POST /api/network-requests`
/// - `POST /api/clicks`
/// - `GET /ws/rotations/{id}`
///
/// Everything under `/api/admin` requires the admin bearer token.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws/rotations/{id}", get(ws::ws_rotation))
        // Public REST API
        .route("/api/networks", get(handlers::list_networks))
        .route("/api/networks/{id}", get(handlers::get_network))
        .route("/api/offers", get(handlers::list_offers))
        .route("/api/offers/{id}", get(handlers::get_offer))
        .route("/api/placements", get(handlers::placements))
        .route("/api/master-data", get(handlers::master_data))
        .route("/api/network-requests", post(handlers::submit_network_request))
        .route("/api/clicks", post(handlers::record_click))
        // Admin API
        .nest("/api/admin", admin_router(Arc::clone(&state)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/networks",
            get(admin::list_networks).post(admin::create_network),
        )
        .route(
            "/networks/{id}",
            get(admin::get_network)
                .put(admin::update_network)
                .delete(admin::delete_network),
        )
        .route(
            "/networks/{id}/affiliate",
            get(admin::get_affiliate_details).put(admin::put_affiliate_details),
        )
        .route("/offers", get(admin::list_offers).post(admin::create_offer))
        .route("/offers/bulk", post(admin::bulk_edit_offers))
        .route("/offers/import", post(admin::import_offers))
        .route(
            "/offers/{id}",
            get(admin::get_offer)
                .put(admin::update_offer)
                .delete(admin::delete_offer),
        )
        .route(
            "/banners",
            get(admin::list_banners).post(admin::create_banner),
        )
        .route("/banners/{id}", delete(admin::delete_banner))
        .route(
            "/rotations",
            get(admin::list_rotations).post(admin::create_rotation),
        )
        .route(
            "/rotations/{id}",
            delete(admin::delete_rotation),
        )
        .route(
            "/master-data",
            get(admin::list_master_data).post(admin::create_master_data),
        )
        .route(
            "/master-data/{id}",
            delete(admin::delete_master_data),
        )
        .route("/audit-logs", get(admin::list_audit_logs))
        .route("/network-requests", get(admin::list_network_requests))
        .route(
            "/network-requests/{id}/approve",
            post(admin::approve_network_request),
        )
        .route(
            "/network-requests/{id}/reject",
            post(admin::reject_network_request),
        )
        .route("/analytics/clicks", get(analytics::clicks))
        .route("/analytics/banners", get(analytics::banners))
        .route("/analytics/summary", get(analytics::summary))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}

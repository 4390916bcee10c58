//! Public and admin HTTP API for the affiliate directory.
//!
//! Serves the visitor-facing directory (networks, offers, banner
//! placements, click logging), a `WebSocket` rotation stream, and the
//! token-guarded admin surface used by the back office.
//!
//! # Modules
//!
//! - [`router`] -- Axum router assembly
//! - [`handlers`] -- Public REST handlers
//! - [`admin`] -- Admin REST handlers
//! - [`analytics`] -- Click analytics handlers
//! - [`ws`] -- Rotation `WebSocket` stream
//! - [`auth`] -- Admin bearer-token guard
//! - [`geo`] -- Country lookup for clicks
//! - [`state`] -- Shared application state
//! - [`error`] -- Error types and HTTP mapping
//! - [`server`] -- Listener lifecycle

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod error;
pub mod extract;
pub mod geo;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use geo::GeoLookup;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;

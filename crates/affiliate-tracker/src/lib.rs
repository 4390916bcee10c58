//! Standalone custom click tracker.
//!
//! A small service with no database: clicks are appended to one JSON
//! array file. It runs separately from the directory API so banner pages
//! hosted elsewhere can report clicks without admin credentials.
//!
//! # Modules
//!
//! - [`config`] -- Environment configuration
//! - [`store`] -- The JSON click file
//! - [`handlers`] -- HTTP handlers
//! - [`router`] -- Router assembly
//! - [`error`] -- Error types and HTTP mapping

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod store;

pub use config::TrackerConfig;
pub use error::TrackerError;
pub use router::build_router;
pub use store::ClickFile;

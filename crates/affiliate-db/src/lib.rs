//! Data layer for the affiliate directory (`PostgreSQL` + in-memory).
//!
//! `PostgreSQL` owns identity generation, timestamps, and referential side
//! effects (offers orphaned on network delete, clicks cascaded on banner
//! delete). The in-memory directory reproduces the same behaviour for tests
//! and local development.
//!
//! # Architecture
//!
//! ```text
//! API handlers
//!     |
//!     +-- Directory (enum dispatch)
//!         |-- Postgres(PostgresPool)
//!         |     |-- NetworkStore     (networks + affiliate_details)
//!         |     |-- OfferStore       (offers)
//!         |     |-- BannerStore      (banners + banner_rotations)
//!         |     |-- MasterDataStore  (master_data)
//!         |     |-- AuditStore       (audit_logs)
//!         |     |-- ClickStore       (banner_clicks + banner_click_counts)
//!         |     +-- RequestStore     (network_requests)
//!         +-- Memory(Arc<MemoryDirectory>)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`directory`] -- Backend-agnostic store handle
//! - [`memory`] -- In-memory backend
//! - [`error`] -- Shared error types

pub mod audit_store;
pub mod banner_store;
pub mod click_store;
mod convert;
pub mod directory;
pub mod error;
pub mod master_data_store;
pub mod memory;
pub mod network_store;
pub mod offer_store;
pub mod postgres;
pub mod request_store;

// Re-export primary types for convenience.
pub use audit_store::AuditStore;
pub use banner_store::BannerStore;
pub use click_store::ClickStore;
pub use directory::Directory;
pub use error::DbError;
pub use master_data_store::MasterDataStore;
pub use memory::MemoryDirectory;
pub use network_store::NetworkStore;
pub use offer_store::OfferStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use request_store::RequestStore;

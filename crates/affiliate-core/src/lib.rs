//! Configuration, banner placement, and directory logic for the affiliate
//! directory.
//!
//! Everything here is pure or runtime-local: no database access and no
//! HTTP. The API crate loads rows through `affiliate-db` and hands them to
//! these functions.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `affiliate-config.yaml`
//! - [`placement`] -- Banner section assignment and rotation claims
//! - [`rotation`] -- Rotation cursor and interval-driven ticker
//! - [`countdown`] -- Time remaining until an expiry
//! - [`browse`] -- Filtering, sorting, and paging of listings
//! - [`validation`] -- Draft validation with configured limits
//! - [`bulk`] -- Bulk offer patches
//! - [`import`] -- Spreadsheet row mapping
//! - [`analytics`] -- Click summaries and per-banner tables
//! - [`audit`] -- Audit log entry construction

pub mod analytics;
pub mod audit;
pub mod browse;
pub mod bulk;
pub mod config;
pub mod countdown;
pub mod import;
pub mod placement;
pub mod rotation;
pub mod validation;

pub use config::{AppConfig, ConfigError, ConfigSource, PlacementConfig};
pub use countdown::{Countdown, WithCountdown};
pub use placement::{PagePlacement, RotationSlot, SectionSlot, assign_sections};
pub use rotation::{RotationCursor, RotationError, RotationFrame, RotationTicker};
pub use validation::ValidationError;

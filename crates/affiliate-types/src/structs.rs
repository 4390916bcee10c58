//! Stored entity records.
//!
//! These mirror the rows of the directory's tables one to one. The
//! database owns identity generation and timestamps; handlers only ever
//! construct these from store results. Writes go through the draft types
//! in [`crate::drafts`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{
    AuditAction, MasterDataCategory, NetworkRequestStatus, OfferStatus, Section,
};
use crate::ids::{
    AuditLogId, BannerId, ClickId, MasterDataId, NetworkId, NetworkRequestId, OfferId,
    RotationId,
};

// ---------------------------------------------------------------------------
// Directory records
// ---------------------------------------------------------------------------

/// An affiliate program that publishes offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Network {
    /// Unique identifier.
    pub id: NetworkId,
    /// Display name.
    pub name: String,
    /// Long-form description shown on the network page.
    pub description: String,
    /// Logo image URL.
    pub logo_url: Option<String>,
    /// Public website of the network.
    pub website_url: Option<String>,
    /// Sign-up link for new affiliates.
    pub signup_url: Option<String>,
    /// Categories the network operates in.
    pub categories: Vec<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Countries or regions the network accepts traffic from.
    pub geo_targets: Vec<String>,
    /// Supported payout methods (PayPal, wire, ...).
    pub payment_methods: Vec<String>,
    /// How often the network pays out (weekly, net-30, ...).
    pub payment_frequency: Option<String>,
    /// Minimum balance before a payout is issued.
    #[ts(as = "Option<String>")]
    pub minimum_payout: Option<Decimal>,
    /// Commission model summary (CPA, `RevShare`, ...).
    pub commission_type: Option<String>,
    /// Editorial rating from 0 to 5.
    #[ts(as = "Option<String>")]
    pub rating: Option<Decimal>,
    /// Whether the network is promoted on the landing page.
    pub featured: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last replaced.
    pub updated_at: DateTime<Utc>,
}

/// A promotable deal published by a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Offer {
    /// Unique identifier.
    pub id: OfferId,
    /// Owning network, if any. Cleared when the network is deleted.
    pub network_id: Option<NetworkId>,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Preview image URL.
    pub image_url: Option<String>,
    /// Affiliate tracking link.
    pub tracking_url: Option<String>,
    /// Payout per conversion.
    #[ts(as = "Option<String>")]
    pub payout: Option<Decimal>,
    /// Payout model (CPA, CPL, CPS, ...).
    pub payout_type: Option<String>,
    /// Categories the offer is listed under.
    pub categories: Vec<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Countries or regions the offer accepts.
    pub geo_targets: Vec<String>,
    /// Device classes the offer accepts.
    pub devices: Vec<String>,
    /// Marketing verticals.
    pub vertical: Vec<String>,
    /// Publication state.
    pub status: OfferStatus,
    /// Whether the offer is promoted on the landing page.
    pub featured: bool,
    /// End of the promotion window, drives the public countdown.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last replaced.
    pub updated_at: DateTime<Utc>,
}

/// A single promotional image unit placed into one or more sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Banner {
    /// Unique identifier.
    pub id: BannerId,
    /// Optional display name used in the admin tables.
    pub title: Option<String>,
    /// Image to render.
    pub image_url: String,
    /// Click-through destinations (zero or more).
    pub links: Vec<String>,
    /// Sections the banner is placed in (one or more).
    pub sections: Vec<Section>,
    /// After this instant the banner is no longer displayed.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

impl Banner {
    /// Return true when the banner is tagged for `section`.
    pub fn targets(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }

    /// Return true when the banner's own expiry has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A named group of banners that cycle on a timer within one section.
///
/// While active (not expired) a rotation claims its member banners, which
/// removes them from standalone display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BannerRotation {
    /// Unique identifier.
    pub id: RotationId,
    /// Display name used in the admin tables.
    pub name: String,
    /// Ordered member banners, displayed in this order.
    pub banner_ids: Vec<BannerId>,
    /// The single section the rotation renders in.
    pub section: Section,
    /// How long each member is displayed before advancing.
    pub rotation_duration_ms: u64,
    /// After this instant the rotation releases its banners.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

/// A curated pick-list value offered by admin forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MasterDataEntry {
    /// Unique identifier.
    pub id: MasterDataId,
    /// Which pick-list the value belongs to.
    pub category: MasterDataCategory,
    /// The value itself.
    pub value: String,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

/// A record of one admin change to one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuditLogEntry {
    /// Unique identifier.
    pub id: AuditLogId,
    /// Table the change applied to (`networks`, `offers`, ...).
    pub entity: String,
    /// Primary key of the changed row.
    pub entity_id: Uuid,
    /// Kind of change.
    pub action: AuditAction,
    /// Who made the change, when known.
    pub actor: Option<String>,
    /// Field-level change description.
    pub changes: serde_json::Value,
    /// When the change was recorded.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Clicks
// ---------------------------------------------------------------------------

/// One recorded click on a banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BannerClick {
    /// Unique identifier.
    pub id: ClickId,
    /// The clicked banner.
    pub banner_id: BannerId,
    /// Signed-in user, when known.
    pub user_id: Option<String>,
    /// Caller IP address as seen by the click logger.
    pub ip_address: Option<String>,
    /// Country resolved from the IP address.
    pub country: Option<String>,
    /// Caller `User-Agent` header.
    pub user_agent: Option<String>,
    /// When the click happened.
    pub clicked_at: DateTime<Utc>,
}

/// Aggregated click totals for one banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BannerClickCount {
    /// The banner the totals belong to.
    pub banner_id: BannerId,
    /// Number of clicks recorded.
    pub clicks: i64,
    /// Number of distinct users (falls back to distinct IPs).
    pub unique_users: i64,
    /// Most recent click, if any.
    pub last_clicked_at: Option<DateTime<Utc>>,
}

/// A click recorded by the standalone custom tracking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CustomClick {
    /// Unique identifier.
    pub id: Uuid,
    /// Banner identifier as sent by the page (not validated).
    pub banner_id: String,
    /// Caller `User-Agent`, from the body or the request header.
    pub user_agent: Option<String>,
    /// When the click was recorded.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Network onboarding
// ---------------------------------------------------------------------------

/// A request from a network to be listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NetworkRequest {
    /// Unique identifier.
    pub id: NetworkRequestId,
    /// Name of the network asking to be listed.
    pub network_name: String,
    /// The network's website.
    pub website_url: Option<String>,
    /// Reply address.
    pub contact_email: String,
    /// Free-form message.
    pub message: String,
    /// Review state.
    pub status: NetworkRequestStatus,
    /// When the request was submitted.
    pub created_at: DateTime<Utc>,
    /// When an admin approved or rejected it.
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Private account details the admin keeps for a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AffiliateDetails {
    /// The network these details belong to.
    pub network_id: NetworkId,
    /// Our affiliate id with the network.
    pub affiliate_id: Option<String>,
    /// Account manager name.
    pub manager_name: Option<String>,
    /// Account manager email.
    pub manager_email: Option<String>,
    /// Free-form notes.
    pub notes: String,
    /// When the details were last saved.
    pub updated_at: DateTime<Utc>,
}

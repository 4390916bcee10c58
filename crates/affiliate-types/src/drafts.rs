//! Write payloads submitted by admin forms and public endpoints.
//!
//! Drafts carry everything a caller may choose; the store fills in
//! identity and timestamps. Field-local rules are declared with
//! [`validator`] derives. Rules that depend on configuration or other rows
//! (rotation size, interval bounds, member existence) live in
//! `affiliate_core::validation`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

use crate::enums::{AuditAction, MasterDataCategory, OfferStatus, Section};
use crate::ids::{BannerId, NetworkId, OfferId};
use crate::lists::{lenient_list, list_from_value, normalize};

/// Default display interval for a new rotation.
pub const DEFAULT_ROTATION_DURATION_MS: u64 = 5_000;

const fn default_rotation_duration_ms() -> u64 {
    DEFAULT_ROTATION_DURATION_MS
}

// ---------------------------------------------------------------------------
// Directory drafts
// ---------------------------------------------------------------------------

/// Fields of a network as submitted by the admin form or an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NetworkDraft {
    /// Display name.
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Logo image URL.
    #[serde(default)]
    #[validate(url(message = "logo_url must be a valid URL"))]
    pub logo_url: Option<String>,
    /// Public website.
    #[serde(default)]
    #[validate(url(message = "website_url must be a valid URL"))]
    pub website_url: Option<String>,
    /// Sign-up link.
    #[serde(default)]
    #[validate(url(message = "signup_url must be a valid URL"))]
    pub signup_url: Option<String>,
    /// Categories.
    #[serde(default, deserialize_with = "lenient_list")]
    pub categories: Vec<String>,
    /// Tags.
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
    /// Accepted countries or regions.
    #[serde(default, deserialize_with = "lenient_list")]
    pub geo_targets: Vec<String>,
    /// Supported payout methods.
    #[serde(default, deserialize_with = "lenient_list")]
    pub payment_methods: Vec<String>,
    /// Payout cadence.
    #[serde(default)]
    pub payment_frequency: Option<String>,
    /// Minimum payout threshold.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub minimum_payout: Option<Decimal>,
    /// Commission model summary.
    #[serde(default)]
    pub commission_type: Option<String>,
    /// Editorial rating, 0 to 5.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub rating: Option<Decimal>,
    /// Promote on the landing page.
    #[serde(default)]
    pub featured: bool,
}

impl NetworkDraft {
    /// Trim text fields, blank optional fields to `None`, and normalize lists.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_owned();
        self.description = self.description.trim().to_owned();
        for field in [
            &mut self.logo_url,
            &mut self.website_url,
            &mut self.signup_url,
            &mut self.payment_frequency,
            &mut self.commission_type,
        ] {
            blank_to_none(field);
        }
        for list in [
            &mut self.categories,
            &mut self.tags,
            &mut self.geo_targets,
            &mut self.payment_methods,
        ] {
            *list = normalize(list.iter());
        }
    }
}

/// Fields of an offer as submitted by the admin form or an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OfferDraft {
    /// Owning network.
    #[serde(default)]
    pub network_id: Option<NetworkId>,
    /// Display name.
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Preview image URL.
    #[serde(default)]
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
    /// Affiliate tracking link.
    #[serde(default)]
    #[validate(url(message = "tracking_url must be a valid URL"))]
    pub tracking_url: Option<String>,
    /// Payout per conversion.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub payout: Option<Decimal>,
    /// Payout model.
    #[serde(default)]
    pub payout_type: Option<String>,
    /// Categories.
    #[serde(default, deserialize_with = "lenient_list")]
    pub categories: Vec<String>,
    /// Tags.
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
    /// Accepted countries or regions.
    #[serde(default, deserialize_with = "lenient_list")]
    pub geo_targets: Vec<String>,
    /// Accepted device classes.
    #[serde(default, deserialize_with = "lenient_list")]
    pub devices: Vec<String>,
    /// Marketing verticals.
    #[serde(default, deserialize_with = "lenient_list")]
    pub vertical: Vec<String>,
    /// Publication state.
    #[serde(default)]
    pub status: OfferStatus,
    /// Promote on the landing page.
    #[serde(default)]
    pub featured: bool,
    /// End of the promotion window.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl OfferDraft {
    /// Trim text fields, blank optional fields to `None`, and normalize lists.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_owned();
        self.description = self.description.trim().to_owned();
        for field in [
            &mut self.image_url,
            &mut self.tracking_url,
            &mut self.payout_type,
        ] {
            blank_to_none(field);
        }
        for list in [
            &mut self.categories,
            &mut self.tags,
            &mut self.geo_targets,
            &mut self.devices,
            &mut self.vertical,
        ] {
            *list = normalize(list.iter());
        }
    }
}

/// Fields of a new banner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BannerDraft {
    /// Optional display name.
    #[serde(default)]
    #[validate(length(max = 120, message = "title must be at most 120 characters"))]
    pub title: Option<String>,
    /// Image to render.
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: String,
    /// Click-through destinations.
    #[serde(default, deserialize_with = "lenient_list")]
    #[validate(custom(function = "validate_urls"))]
    pub links: Vec<String>,
    /// Target sections.
    #[serde(deserialize_with = "lenient_sections")]
    #[validate(length(min = 1, message = "at least one section is required"))]
    pub sections: Vec<Section>,
    /// When the banner stops being displayed.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Fields of a new banner rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RotationDraft {
    /// Display name.
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    /// Ordered member banners.
    pub banner_ids: Vec<BannerId>,
    /// The section the rotation renders in.
    pub section: Section,
    /// Display interval per member.
    #[serde(default = "default_rotation_duration_ms")]
    pub rotation_duration_ms: u64,
    /// When the rotation releases its banners.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A new master data pick-list value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MasterDataDraft {
    /// Target pick-list.
    pub category: MasterDataCategory,
    /// The value.
    #[validate(length(min = 1, max = 120, message = "value must be 1-120 characters"))]
    pub value: String,
}

/// A public request from a network to be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NetworkRequestDraft {
    /// Name of the network.
    #[validate(length(min = 1, max = 200, message = "network_name must be 1-200 characters"))]
    pub network_name: String,
    /// The network's website.
    #[serde(default)]
    #[validate(url(message = "website_url must be a valid URL"))]
    pub website_url: Option<String>,
    /// Reply address.
    #[validate(email(message = "contact_email must be a valid email address"))]
    pub contact_email: String,
    /// Free-form message.
    #[serde(default)]
    #[validate(length(max = 2000, message = "message must be at most 2000 characters"))]
    pub message: String,
}

/// Private account details for a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AffiliateDetailsDraft {
    /// Our affiliate id with the network.
    #[serde(default)]
    pub affiliate_id: Option<String>,
    /// Account manager name.
    #[serde(default)]
    pub manager_name: Option<String>,
    /// Account manager email.
    #[serde(default)]
    #[validate(email(message = "manager_email must be a valid email address"))]
    pub manager_email: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Store inserts that never come straight from a form
// ---------------------------------------------------------------------------

/// A click row to insert, assembled by the click logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBannerClick {
    /// The clicked banner.
    pub banner_id: BannerId,
    /// Signed-in user, when known.
    pub user_id: Option<String>,
    /// Caller IP address.
    pub ip_address: Option<String>,
    /// Resolved country.
    pub country: Option<String>,
    /// Caller `User-Agent`.
    pub user_agent: Option<String>,
}

/// An audit row to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// Table the change applied to.
    pub entity: String,
    /// Primary key of the changed row.
    pub entity_id: Uuid,
    /// Kind of change.
    pub action: AuditAction,
    /// Who made the change.
    pub actor: Option<String>,
    /// Field-level change description.
    pub changes: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Bulk edit
// ---------------------------------------------------------------------------

/// Partial update applied to every offer selected in a bulk edit.
///
/// Absent fields are left untouched. `network_id: null` clears the owning
/// network, while omitting `network_id` keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OfferPatch {
    /// New publication state.
    #[serde(default)]
    #[ts(optional)]
    pub status: Option<OfferStatus>,
    /// New featured flag.
    #[serde(default)]
    #[ts(optional)]
    pub featured: Option<bool>,
    /// New owning network; `Some(None)` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    #[ts(optional)]
    pub network_id: Option<Option<NetworkId>>,
    /// New payout.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub payout: Option<Decimal>,
    /// New payout model.
    #[serde(default)]
    #[ts(optional)]
    pub payout_type: Option<String>,
    /// Tags to add.
    #[serde(default, deserialize_with = "lenient_list")]
    pub add_tags: Vec<String>,
    /// Tags to remove.
    #[serde(default, deserialize_with = "lenient_list")]
    pub remove_tags: Vec<String>,
    /// Categories to add.
    #[serde(default, deserialize_with = "lenient_list")]
    pub add_categories: Vec<String>,
    /// Categories to remove.
    #[serde(default, deserialize_with = "lenient_list")]
    pub remove_categories: Vec<String>,
    /// Geo targets to add.
    #[serde(default, deserialize_with = "lenient_list")]
    pub add_geo_targets: Vec<String>,
    /// Geo targets to remove.
    #[serde(default, deserialize_with = "lenient_list")]
    pub remove_geo_targets: Vec<String>,
}

impl OfferPatch {
    /// Return true when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.featured.is_none()
            && self.network_id.is_none()
            && self.payout.is_none()
            && self.payout_type.is_none()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
            && self.add_categories.is_empty()
            && self.remove_categories.is_empty()
            && self.add_geo_targets.is_empty()
            && self.remove_geo_targets.is_empty()
    }
}

/// A bulk edit request: one patch applied to many offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BulkOfferEdit {
    /// Offers to update.
    #[validate(length(min = 1, max = 500, message = "select between 1 and 500 offers"))]
    pub ids: Vec<OfferId>,
    /// The change to apply.
    pub patch: OfferPatch,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Validate that every entry of a link list is an absolute URL.
fn validate_urls(links: &[String]) -> Result<(), ValidationError> {
    let bad = links.iter().any(|link| !link.validate_url());
    if bad {
        let mut err = ValidationError::new("url");
        err.message = Some("every link must be a valid URL".into());
        return Err(err);
    }
    Ok(())
}

/// Deserialize a section list from an array or a delimited string.
fn lenient_sections<'de, D>(deserializer: D) -> Result<Vec<Section>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let mut sections = Vec::new();
    for raw in list_from_value(&value) {
        let section: Section = raw.parse().map_err(serde::de::Error::custom)?;
        if !sections.contains(&section) {
            sections.push(section);
        }
    }
    Ok(sections)
}

/// Distinguish an explicit `null` from an absent field.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn blank_to_none(field: &mut Option<String>) {
    *field = field
        .take()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());
}

//! Draft validation for admin and public writes.
//!
//! Field-local rules come from the `validator` derives on the draft types.
//! This module adds the rules that need configuration or the clock, and
//! folds everything into one [`ValidationError`] keyed by field name.

use std::collections::{BTreeMap, BTreeSet};

use affiliate_types::lists::normalize;
use affiliate_types::{
    AffiliateDetailsDraft, BannerDraft, BulkOfferEdit, MasterDataDraft, NetworkDraft,
    NetworkRequestDraft, OfferDraft, RotationDraft,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use validator::Validate;

use crate::config::PlacementConfig;

/// One or more fields of a draft are invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("validation failed")]
pub struct ValidationError {
    /// Messages per offending field.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Record `message` against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Return true when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Flatten into `field: message` lines, in field order.
    pub fn messages(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{field}: {m}")))
            .collect()
    }

    fn merge_derived(&mut self, derived: Result<(), validator::ValidationErrors>) {
        if let Err(errors) = derived {
            for (field, list) in errors.field_errors() {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map_or_else(|| format!("invalid {field} ({})", err.code), ToString::to_string);
                    self.add(&field, message);
                }
            }
        }
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Self::default();
        out.merge_derived(Err(errors));
        out
    }
}

/// Normalize and validate a banner draft.
pub fn validate_banner(draft: &mut BannerDraft, now: DateTime<Utc>) -> Result<(), ValidationError> {
    draft.links = normalize(draft.links.iter());
    draft.title = draft
        .title
        .take()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty());
    draft.image_url = draft.image_url.trim().to_owned();
    let mut seen = BTreeSet::new();
    draft.sections.retain(|s| seen.insert(*s));

    let mut errors = ValidationError::default();
    errors.merge_derived(draft.validate());
    check_future(&mut errors, draft.expires_at, now);
    errors.into_result()
}

/// Validate a rotation draft against the configured limits.
///
/// Member existence is checked by the caller against the store.
pub fn validate_rotation(
    draft: &mut RotationDraft,
    limits: &PlacementConfig,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    draft.name = draft.name.trim().to_owned();

    let mut errors = ValidationError::default();
    errors.merge_derived(draft.validate());

    let count = draft.banner_ids.len();
    if count < limits.min_rotation_members || count > limits.max_rotation_members {
        errors.add(
            "banner_ids",
            format!(
                "a rotation needs between {} and {} banners",
                limits.min_rotation_members, limits.max_rotation_members
            ),
        );
    }
    let unique: BTreeSet<_> = draft.banner_ids.iter().collect();
    if unique.len() != count {
        errors.add("banner_ids", "a banner may appear only once in a rotation");
    }

    let interval = draft.rotation_duration_ms;
    if interval < limits.min_interval_ms || interval > limits.max_interval_ms {
        errors.add(
            "rotation_duration_ms",
            format!(
                "interval must be between {} and {} ms",
                limits.min_interval_ms, limits.max_interval_ms
            ),
        );
    }

    check_future(&mut errors, draft.expires_at, now);
    errors.into_result()
}

/// Normalize and validate a network draft.
pub fn validate_network(draft: &mut NetworkDraft) -> Result<(), ValidationError> {
    draft.normalize();
    let mut errors = ValidationError::default();
    errors.merge_derived(draft.validate());
    if let Some(rating) = draft.rating
        && (rating < Decimal::ZERO || rating > Decimal::from(5))
    {
        errors.add("rating", "rating must be between 0 and 5");
    }
    if draft.minimum_payout.is_some_and(|p| p < Decimal::ZERO) {
        errors.add("minimum_payout", "minimum_payout must not be negative");
    }
    errors.into_result()
}

/// Normalize and validate an offer draft.
pub fn validate_offer(draft: &mut OfferDraft) -> Result<(), ValidationError> {
    draft.normalize();
    let mut errors = ValidationError::default();
    errors.merge_derived(draft.validate());
    if draft.payout.is_some_and(|p| p < Decimal::ZERO) {
        errors.add("payout", "payout must not be negative");
    }
    errors.into_result()
}

/// Validate a master data value.
pub fn validate_master_data(draft: &mut MasterDataDraft) -> Result<(), ValidationError> {
    draft.value = draft.value.trim().to_owned();
    let mut errors = ValidationError::default();
    errors.merge_derived(draft.validate());
    errors.into_result()
}

/// Validate a public network join request.
pub fn validate_network_request(draft: &mut NetworkRequestDraft) -> Result<(), ValidationError> {
    draft.network_name = draft.network_name.trim().to_owned();
    draft.contact_email = draft.contact_email.trim().to_owned();
    draft.message = draft.message.trim().to_owned();
    let mut errors = ValidationError::default();
    errors.merge_derived(draft.validate());
    errors.into_result()
}

/// Validate affiliate account details.
pub fn validate_affiliate_details(draft: &AffiliateDetailsDraft) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    errors.merge_derived(draft.validate());
    errors.into_result()
}

/// Validate a bulk edit request.
pub fn validate_bulk_edit(edit: &BulkOfferEdit) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    errors.merge_derived(edit.validate());
    if edit.patch.is_empty() {
        errors.add("patch", "the patch does not change anything");
    }
    if edit.patch.payout.is_some_and(|p| p < Decimal::ZERO) {
        errors.add("patch.payout", "payout must not be negative");
    }
    errors.into_result()
}

fn check_future(errors: &mut ValidationError, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) {
    if expires_at.is_some_and(|at| at <= now) {
        errors.add("expires_at", "expires_at must be in the future");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

    use affiliate_types::{BannerId, OfferPatch, Section};
    use chrono::Duration;

    use super::*;

    fn rotation(ids: Vec<BannerId>, interval: u64) -> RotationDraft {
        RotationDraft {
            name: " Summer ".to_owned(),
            banner_ids: ids,
            section: Section::Top,
            rotation_duration_ms: interval,
            expires_at: None,
        }
    }

    #[test]
    fn rotation_size_and_interval_bounds() {
        let limits = PlacementConfig::default();
        let now = Utc::now();

        let mut ok = rotation(vec![BannerId::new(), BannerId::new()], 1000);
        assert!(validate_rotation(&mut ok, &limits, now).is_ok());
        assert_eq!(ok.name, "Summer");

        let mut one = rotation(vec![BannerId::new()], 1000);
        let err = validate_rotation(&mut one, &limits, now).unwrap_err();
        assert!(err.fields.contains_key("banner_ids"));

        let six = (0..6).map(|_| BannerId::new()).collect();
        assert!(validate_rotation(&mut rotation(six, 1000), &limits, now).is_err());

        let mut fast = rotation(vec![BannerId::new(), BannerId::new()], 10);
        let err = validate_rotation(&mut fast, &limits, now).unwrap_err();
        assert!(err.fields.contains_key("rotation_duration_ms"));
    }

    #[test]
    fn rotation_rejects_duplicates_and_past_expiry() {
        let id = BannerId::new();
        let mut draft = rotation(vec![id, id], 2000);
        draft.expires_at = Some(Utc::now() - Duration::hours(1));
        let err = validate_rotation(&mut draft, &PlacementConfig::default(), Utc::now()).unwrap_err();
        assert!(err.fields.contains_key("banner_ids"));
        assert!(err.fields.contains_key("expires_at"));
    }

    #[test]
    fn banner_sections_are_deduplicated_before_checks() {
        let mut draft = BannerDraft {
            title: Some("  ".to_owned()),
            image_url: " https://cdn.example.com/x.png ".to_owned(),
            links: vec!["https://a.example.com".to_owned(), "https://a.example.com".to_owned()],
            sections: vec![Section::Top, Section::Top],
            expires_at: None,
        };
        assert!(validate_banner(&mut draft, Utc::now()).is_ok());
        assert_eq!(draft.sections, vec![Section::Top]);
        assert_eq!(draft.links.len(), 1);
        assert!(draft.title.is_none());
    }

    #[test]
    fn network_rating_range() {
        let mut draft = NetworkDraft {
            name: "Acme".to_owned(),
            rating: Some(Decimal::from(7)),
            ..NetworkDraft::default()
        };
        let err = validate_network(&mut draft).unwrap_err();
        assert_eq!(err.fields["rating"], vec!["rating must be between 0 and 5".to_owned()]);
    }

    #[test]
    fn offer_messages_flatten_with_field_names() {
        let mut draft = OfferDraft {
            name: String::new(),
            payout: Some(Decimal::from(-1)),
            ..OfferDraft::default()
        };
        let err = validate_offer(&mut draft).unwrap_err();
        let messages = err.messages();
        assert!(messages.contains(&"name: name must be 1-200 characters".to_owned()));
        assert!(messages.contains(&"payout: payout must not be negative".to_owned()));
    }

    #[test]
    fn empty_bulk_patch_is_rejected() {
        let edit = BulkOfferEdit {
            ids: vec![affiliate_types::OfferId::new()],
            patch: OfferPatch::default(),
        };
        let err = validate_bulk_edit(&edit).unwrap_err();
        assert!(err.fields.contains_key("patch"));
    }
}

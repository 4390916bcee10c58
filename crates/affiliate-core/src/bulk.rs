//! Bulk edit of offers.

use affiliate_types::lists::contains_ignore_case;
use affiliate_types::{Offer, OfferId, OfferPatch};
use serde::Serialize;

/// Outcome of a bulk edit, one bucket per requested id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Offers that changed and were written.
    pub updated: Vec<OfferId>,
    /// Offers the patch left as they were.
    pub unchanged: Vec<OfferId>,
    /// Requested ids that matched no offer.
    pub missing: Vec<OfferId>,
}

/// Apply `patch` to `offer` in place. Returns true when anything changed.
pub fn apply_patch(offer: &mut Offer, patch: &OfferPatch) -> bool {
    let before = offer.clone();

    if let Some(status) = patch.status {
        offer.status = status;
    }
    if let Some(featured) = patch.featured {
        offer.featured = featured;
    }
    if let Some(network_id) = patch.network_id {
        offer.network_id = network_id;
    }
    if let Some(payout) = patch.payout {
        offer.payout = Some(payout);
    }
    if let Some(payout_type) = &patch.payout_type {
        let trimmed = payout_type.trim();
        offer.payout_type = (!trimmed.is_empty()).then(|| trimmed.to_owned());
    }

    edit_list(&mut offer.tags, &patch.add_tags, &patch.remove_tags);
    edit_list(&mut offer.categories, &patch.add_categories, &patch.remove_categories);
    edit_list(&mut offer.geo_targets, &patch.add_geo_targets, &patch.remove_geo_targets);

    *offer != before
}

/// Remove then add, case-insensitively, keeping existing order.
fn edit_list(list: &mut Vec<String>, add: &[String], remove: &[String]) {
    list.retain(|entry| !contains_ignore_case(remove, entry));
    for item in add {
        let item = item.trim();
        if !item.is_empty() && !contains_ignore_case(list, item) {
            list.push(item.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use affiliate_types::{NetworkId, OfferStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn offer() -> Offer {
        let now = Utc::now();
        Offer {
            id: OfferId::new(),
            network_id: Some(NetworkId::new()),
            name: "Card".to_owned(),
            description: String::new(),
            image_url: None,
            tracking_url: None,
            payout: Some(Decimal::from(10)),
            payout_type: Some("CPA".to_owned()),
            categories: vec!["Finance".to_owned()],
            tags: vec!["hot".to_owned(), "new".to_owned()],
            geo_targets: vec!["US".to_owned()],
            devices: Vec::new(),
            vertical: Vec::new(),
            status: OfferStatus::Active,
            featured: false,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn list_edits_are_case_insensitive() {
        let mut o = offer();
        let patch = OfferPatch {
            add_tags: vec!["HOT".to_owned(), "sale".to_owned()],
            remove_tags: vec!["NEW".to_owned()],
            add_geo_targets: vec!["ca".to_owned()],
            ..OfferPatch::default()
        };
        assert!(apply_patch(&mut o, &patch));
        assert_eq!(o.tags, vec!["hot".to_owned(), "sale".to_owned()]);
        assert_eq!(o.geo_targets, vec!["US".to_owned(), "ca".to_owned()]);
    }

    #[test]
    fn patch_matching_current_values_reports_unchanged() {
        let mut o = offer();
        let patch = OfferPatch {
            status: Some(OfferStatus::Active),
            add_categories: vec!["finance".to_owned()],
            ..OfferPatch::default()
        };
        assert!(!apply_patch(&mut o, &patch));
    }

    #[test]
    fn explicit_null_network_clears_owner() {
        let mut o = offer();
        let patch = OfferPatch {
            network_id: Some(None),
            status: Some(OfferStatus::Paused),
            ..OfferPatch::default()
        };
        assert!(apply_patch(&mut o, &patch));
        assert!(o.network_id.is_none());
        assert_eq!(o.status, OfferStatus::Paused);
    }

    #[test]
    fn blank_payout_type_clears_it() {
        let mut o = offer();
        let patch = OfferPatch {
            payout_type: Some("  ".to_owned()),
            ..OfferPatch::default()
        };
        assert!(apply_patch(&mut o, &patch));
        assert!(o.payout_type.is_none());
    }
}

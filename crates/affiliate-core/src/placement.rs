//! Banner section assignment for one page load.
//!
//! Given every stored banner and rotation, decide what renders in each of
//! the five layout sections. Active rotations claim their member banners:
//! a claimed banner is only ever shown through its rotation, never as a
//! standalone banner in any section. Expired rotations release their
//! members back to standalone display.

use std::collections::{BTreeMap, BTreeSet};

use affiliate_types::{Banner, BannerId, BannerRotation, RotationId, Section};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::countdown::{Countdown, WithCountdown};

/// What renders in every section, in layout order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagePlacement {
    /// One slot per section, always all five, top to bottom.
    pub sections: Vec<SectionSlot>,
}

impl PagePlacement {
    /// Borrow the slot for `section`.
    pub fn slot(&self, section: Section) -> Option<&SectionSlot> {
        self.sections.iter().find(|slot| slot.section == section)
    }
}

/// The contents of one layout section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSlot {
    /// Which section this is.
    pub section: Section,
    /// Active rotations targeting the section.
    pub rotations: Vec<RotationSlot>,
    /// Unclaimed, unexpired banners targeting the section.
    pub banners: Vec<WithCountdown<Banner>>,
}

impl SectionSlot {
    /// Return true when nothing renders in this section.
    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty() && self.banners.is_empty()
    }
}

/// An active rotation with its members resolved to banners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationSlot {
    /// The rotation.
    pub rotation_id: RotationId,
    /// Display name.
    pub name: String,
    /// Per-member display interval.
    pub rotation_duration_ms: u64,
    /// When the rotation releases its banners.
    pub expires_at: Option<DateTime<Utc>>,
    /// Time left before expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<Countdown>,
    /// Members in display order.
    pub banners: Vec<Banner>,
}

/// Return true when the rotation has no expiry or expires after `now`.
pub fn is_rotation_active(rotation: &BannerRotation, now: DateTime<Utc>) -> bool {
    rotation.expires_at.is_none_or(|at| at > now)
}

/// The active subset of `rotations`, in input order.
pub fn active_rotations(rotations: &[BannerRotation], now: DateTime<Utc>) -> Vec<&BannerRotation> {
    rotations
        .iter()
        .filter(|r| is_rotation_active(r, now))
        .collect()
}

/// Every banner id claimed by the given rotations.
pub fn claimed_banner_ids<'a, I>(active: I) -> BTreeSet<BannerId>
where
    I: IntoIterator<Item = &'a BannerRotation>,
{
    active
        .into_iter()
        .flat_map(|r| r.banner_ids.iter().copied())
        .collect()
}

/// Banners targeting `section` that are neither claimed nor expired, in
/// input order.
pub fn standalone_banners<'a>(
    banners: &'a [Banner],
    section: Section,
    claimed: &BTreeSet<BannerId>,
    now: DateTime<Utc>,
) -> Vec<&'a Banner> {
    banners
        .iter()
        .filter(|b| b.targets(section) && !claimed.contains(&b.id) && !b.is_expired(now))
        .collect()
}

/// Members of `candidate` already claimed by another active rotation.
///
/// `exclude` skips the rotation being replaced so it is not compared with
/// itself.
pub fn overlapping_banner_ids(
    candidate: &[BannerId],
    rotations: &[BannerRotation],
    exclude: Option<RotationId>,
    now: DateTime<Utc>,
) -> Vec<BannerId> {
    let claimed = claimed_banner_ids(
        rotations
            .iter()
            .filter(|r| Some(r.id) != exclude && is_rotation_active(r, now)),
    );
    let mut seen = BTreeSet::new();
    candidate
        .iter()
        .copied()
        .filter(|id| claimed.contains(id) && seen.insert(*id))
        .collect()
}

/// Build the full page placement.
pub fn assign_sections(
    banners: &[Banner],
    rotations: &[BannerRotation],
    now: DateTime<Utc>,
) -> PagePlacement {
    let active = active_rotations(rotations, now);
    let claimed = claimed_banner_ids(active.iter().copied());
    let by_id: BTreeMap<BannerId, &Banner> = banners.iter().map(|b| (b.id, b)).collect();

    let sections = Section::ALL
        .iter()
        .map(|&section| {
            let rotations = active
                .iter()
                .filter(|r| r.section == section)
                .filter_map(|r| resolve_rotation(r, &by_id, now))
                .collect();
            let banners = standalone_banners(banners, section, &claimed, now)
                .into_iter()
                .map(|b| WithCountdown::new(b.clone(), b.expires_at, now))
                .collect();
            SectionSlot {
                section,
                rotations,
                banners,
            }
        })
        .collect();

    PagePlacement { sections }
}

/// Resolve members in `banner_ids` order, skipping ids that did not load.
/// Returns `None` when no member resolves.
fn resolve_rotation(
    rotation: &BannerRotation,
    by_id: &BTreeMap<BannerId, &Banner>,
    now: DateTime<Utc>,
) -> Option<RotationSlot> {
    let members: Vec<Banner> = rotation
        .banner_ids
        .iter()
        .filter_map(|id| by_id.get(id).map(|b| (*b).clone()))
        .collect();
    if members.is_empty() {
        tracing::debug!(rotation_id = %rotation.id, "rotation has no loadable members, skipping");
        return None;
    }
    Some(RotationSlot {
        rotation_id: rotation.id,
        name: rotation.name.clone(),
        rotation_duration_ms: rotation.rotation_duration_ms,
        expires_at: rotation.expires_at,
        countdown: Countdown::for_expiry(rotation.expires_at, now),
        banners: members,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn banner(sections: &[Section]) -> Banner {
        Banner {
            id: BannerId::new(),
            title: None,
            image_url: "https://cdn.example.com/b.png".to_owned(),
            links: vec!["https://example.com".to_owned()],
            sections: sections.to_vec(),
            expires_at: None,
            created_at: now(),
        }
    }

    fn rotation(section: Section, ids: &[BannerId], expires_at: Option<DateTime<Utc>>) -> BannerRotation {
        BannerRotation {
            id: RotationId::new(),
            name: "promo".to_owned(),
            banner_ids: ids.to_vec(),
            section,
            rotation_duration_ms: 1000,
            expires_at,
            created_at: now(),
        }
    }

    fn standalone_ids(placement: &PagePlacement, section: Section) -> Vec<BannerId> {
        placement
            .slot(section)
            .unwrap()
            .banners
            .iter()
            .map(|b| b.item.id)
            .collect()
    }

    #[test]
    fn claimed_banners_leave_every_standalone_list() {
        let a = banner(&[Section::Top, Section::Footer]);
        let b = banner(&[Section::Top]);
        let c = banner(&[Section::Top]);
        let r = rotation(Section::Sidebar, &[a.id, b.id], None);
        let banners = vec![a.clone(), b.clone(), c.clone()];

        let placement = assign_sections(&banners, &[r.clone()], now());

        assert_eq!(standalone_ids(&placement, Section::Top), vec![c.id]);
        assert!(standalone_ids(&placement, Section::Footer).is_empty());
        let sidebar = placement.slot(Section::Sidebar).unwrap();
        assert_eq!(sidebar.rotations.len(), 1);
        let members: Vec<BannerId> = sidebar.rotations[0].banners.iter().map(|b| b.id).collect();
        assert_eq!(members, vec![a.id, b.id]);
    }

    #[test]
    fn expired_rotation_releases_members() {
        let a = banner(&[Section::Top]);
        let b = banner(&[Section::Top]);
        let r = rotation(Section::Top, &[a.id, b.id], Some(now() - Duration::minutes(1)));

        let placement = assign_sections(&[a.clone(), b.clone()], &[r], now());

        let top = placement.slot(Section::Top).unwrap();
        assert!(top.rotations.is_empty());
        assert_eq!(standalone_ids(&placement, Section::Top), vec![a.id, b.id]);
    }

    #[test]
    fn rotation_expiring_exactly_now_is_inactive() {
        let r = rotation(Section::Top, &[], Some(now()));
        assert!(!is_rotation_active(&r, now()));
        let later = rotation(Section::Top, &[], Some(now() + Duration::seconds(1)));
        assert!(is_rotation_active(&later, now()));
    }

    #[test]
    fn empty_input_yields_five_empty_slots() {
        let placement = assign_sections(&[], &[], now());
        assert_eq!(placement.sections.len(), 5);
        assert!(placement.sections.iter().all(SectionSlot::is_empty));
        let order: Vec<Section> = placement.sections.iter().map(|s| s.section).collect();
        assert_eq!(order, Section::ALL.to_vec());
    }

    #[test]
    fn members_resolve_in_rotation_order_and_missing_are_skipped() {
        let a = banner(&[Section::Footer]);
        let b = banner(&[Section::Footer]);
        let ghost = BannerId::new();
        let r = rotation(Section::Footer, &[b.id, ghost, a.id], None);

        let placement = assign_sections(&[a.clone(), b.clone()], &[r], now());

        let slot = placement.slot(Section::Footer).unwrap();
        let members: Vec<BannerId> = slot.rotations[0].banners.iter().map(|m| m.id).collect();
        assert_eq!(members, vec![b.id, a.id]);
    }

    #[test]
    fn rotation_with_no_loadable_members_is_omitted() {
        let r = rotation(Section::Top, &[BannerId::new(), BannerId::new()], None);
        let placement = assign_sections(&[], &[r], now());
        assert!(placement.slot(Section::Top).unwrap().rotations.is_empty());
    }

    #[test]
    fn expired_banner_is_hidden() {
        let mut a = banner(&[Section::Top]);
        a.expires_at = Some(now() - Duration::seconds(5));
        let b = banner(&[Section::Top]);
        let placement = assign_sections(&[a, b.clone()], &[], now());
        assert_eq!(standalone_ids(&placement, Section::Top), vec![b.id]);
    }

    #[test]
    fn banner_in_two_rotations_shows_in_both() {
        let a = banner(&[Section::Top]);
        let b = banner(&[Section::Top]);
        let c = banner(&[Section::Top]);
        let first = rotation(Section::Top, &[a.id, b.id], None);
        let second = rotation(Section::Footer, &[a.id, c.id], None);

        let placement = assign_sections(&[a.clone(), b, c], &[first, second], now());

        for section in [Section::Top, Section::Footer] {
            let slot = placement.slot(section).unwrap();
            assert!(slot.rotations[0].banners.iter().any(|m| m.id == a.id));
        }
    }

    #[test]
    fn overlap_detection_ignores_excluded_and_expired() {
        let a = BannerId::new();
        let b = BannerId::new();
        let live = rotation(Section::Top, &[a, b], None);
        let dead = rotation(Section::Top, &[b], Some(now() - Duration::hours(1)));
        let rotations = vec![live.clone(), dead];

        assert_eq!(overlapping_banner_ids(&[b, a, b], &rotations, None, now()), vec![b, a]);
        assert!(overlapping_banner_ids(&[a, b], &rotations, Some(live.id), now()).is_empty());
    }
}

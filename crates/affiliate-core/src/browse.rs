//! Filtering, sorting, and paging of directory listings.
//!
//! Listings are filtered in memory over the full fetched set.

use core::cmp::Ordering;

use affiliate_types::lists::{contains_ignore_case, eq_folded};
use affiliate_types::{Network, NetworkId, Offer, OfferStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Page size when the query names none.
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Largest page a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// A listing query that cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowseError {
    /// `page` was zero.
    #[error("page must be at least 1")]
    InvalidPage,

    /// `per_page` was outside `1..=100`.
    #[error("per_page must be between 1 and {MAX_PER_PAGE}")]
    InvalidPerPage,

    /// `network_id` was not a UUID.
    #[error("invalid network_id: {0}")]
    InvalidNetworkId(String),
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Name, case-insensitive ascending.
    Name,
    /// Highest payout first, unknown payouts last.
    Payout,
    /// Highest rating first, unrated last.
    Rating,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Matching items before paging.
    pub total: usize,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Items on this page.
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Transform every item while keeping the paging fields.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Query parameters for network listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkQuery {
    /// Substring matched against name, description, and tags.
    pub search: Option<String>,
    /// Required category.
    pub category: Option<String>,
    /// Required tag.
    pub tag: Option<String>,
    /// Required geo target.
    pub geo: Option<String>,
    /// Only featured (or only non-featured) networks.
    pub featured: Option<bool>,
    /// Listing order.
    #[serde(default)]
    pub sort: SortOrder,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Query parameters for offer listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OfferQuery {
    /// Substring matched against name, description, and tags.
    pub search: Option<String>,
    /// Owning network.
    pub network_id: Option<String>,
    /// Required category.
    pub category: Option<String>,
    /// Required tag.
    pub tag: Option<String>,
    /// Required geo target.
    pub geo: Option<String>,
    /// Required device class.
    pub device: Option<String>,
    /// Required vertical.
    pub vertical: Option<String>,
    /// Required payout model.
    pub payout_type: Option<String>,
    /// Required status.
    pub status: Option<OfferStatus>,
    /// Only featured (or only non-featured) offers.
    pub featured: Option<bool>,
    /// Listing order.
    #[serde(default)]
    pub sort: SortOrder,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Validate and default the paging parameters.
pub fn resolve_paging(page: Option<u32>, per_page: Option<u32>) -> Result<(u32, u32), BrowseError> {
    let page = page.unwrap_or(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
    if page == 0 {
        return Err(BrowseError::InvalidPage);
    }
    if per_page == 0 || per_page > MAX_PER_PAGE {
        return Err(BrowseError::InvalidPerPage);
    }
    Ok((page, per_page))
}

/// Slice the `page`-th page out of `items`.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let total = items.len();
    let size = usize::try_from(per_page).unwrap_or(usize::MAX);
    let skip = usize::try_from(page.saturating_sub(1))
        .unwrap_or(usize::MAX)
        .saturating_mul(size);
    Page {
        total,
        page,
        per_page,
        items: items.into_iter().skip(skip).take(size).collect(),
    }
}

/// Filter, sort, and page networks.
pub fn filter_networks(networks: Vec<Network>, query: &NetworkQuery) -> Result<Page<Network>, BrowseError> {
    let (page, per_page) = resolve_paging(query.page, query.per_page)?;
    let search = folded(query.search.as_deref());

    let mut matched: Vec<Network> = networks
        .into_iter()
        .filter(|n| {
            search
                .as_deref()
                .is_none_or(|s| text_matches(s, &n.name, &n.description, &n.tags))
                && list_filter(&n.categories, query.category.as_deref())
                && list_filter(&n.tags, query.tag.as_deref())
                && list_filter(&n.geo_targets, query.geo.as_deref())
                && query.featured.is_none_or(|f| n.featured == f)
        })
        .collect();

    matched.sort_by(|a, b| match query.sort {
        SortOrder::Newest => b.created_at.cmp(&a.created_at),
        SortOrder::Oldest => a.created_at.cmp(&b.created_at),
        SortOrder::Name => by_name(&a.name, &b.name),
        SortOrder::Payout => desc_none_last(a.minimum_payout, b.minimum_payout),
        SortOrder::Rating => desc_none_last(a.rating, b.rating),
    });

    Ok(paginate(matched, page, per_page))
}

/// Filter, sort, and page offers.
///
/// `default_status` applies when the query names no status; the public
/// listing passes `Some(Active)`, the admin listing passes `None`.
pub fn filter_offers(
    offers: Vec<Offer>,
    query: &OfferQuery,
    default_status: Option<OfferStatus>,
) -> Result<Page<Offer>, BrowseError> {
    let (page, per_page) = resolve_paging(query.page, query.per_page)?;
    let network_id = query
        .network_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|raw| {
            raw.parse::<NetworkId>()
                .map_err(|_bad| BrowseError::InvalidNetworkId(raw.to_owned()))
        })
        .transpose()?;
    let status = query.status.or(default_status);
    let search = folded(query.search.as_deref());

    let mut matched: Vec<Offer> = offers
        .into_iter()
        .filter(|o| {
            search
                .as_deref()
                .is_none_or(|s| text_matches(s, &o.name, &o.description, &o.tags))
                && network_id.is_none_or(|id| o.network_id == Some(id))
                && status.is_none_or(|s| o.status == s)
                && list_filter(&o.categories, query.category.as_deref())
                && list_filter(&o.tags, query.tag.as_deref())
                && list_filter(&o.geo_targets, query.geo.as_deref())
                && list_filter(&o.devices, query.device.as_deref())
                && list_filter(&o.vertical, query.vertical.as_deref())
                && query.payout_type.as_deref().is_none_or(|want| {
                    o.payout_type
                        .as_deref()
                        .is_some_and(|have| eq_folded(have, want.trim()))
                })
                && query.featured.is_none_or(|f| o.featured == f)
        })
        .collect();

    matched.sort_by(|a, b| match query.sort {
        SortOrder::Newest | SortOrder::Rating => b.created_at.cmp(&a.created_at),
        SortOrder::Oldest => a.created_at.cmp(&b.created_at),
        SortOrder::Name => by_name(&a.name, &b.name),
        SortOrder::Payout => desc_none_last(a.payout, b.payout),
    });

    Ok(paginate(matched, page, per_page))
}

fn folded(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn text_matches(needle: &str, name: &str, description: &str, tags: &[String]) -> bool {
    name.to_lowercase().contains(needle)
        || description.to_lowercase().contains(needle)
        || tags.iter().any(|t| t.to_lowercase().contains(needle))
}

fn list_filter(list: &[String], wanted: Option<&str>) -> bool {
    wanted
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .is_none_or(|w| contains_ignore_case(list, w))
}

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn desc_none_last(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn offer(name: &str, age_days: i64) -> Offer {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() - Duration::days(age_days);
        Offer {
            id: affiliate_types::OfferId::new(),
            network_id: None,
            name: name.to_owned(),
            description: String::new(),
            image_url: None,
            tracking_url: None,
            payout: None,
            payout_type: None,
            categories: Vec::new(),
            tags: Vec::new(),
            geo_targets: Vec::new(),
            devices: Vec::new(),
            vertical: Vec::new(),
            status: OfferStatus::Active,
            featured: false,
            expires_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn names<T>(page: &Page<T>, name: impl Fn(&T) -> &str) -> Vec<String> {
        page.items.iter().map(|i| name(i).to_owned()).collect()
    }

    #[test]
    fn public_default_hides_inactive_offers() {
        let mut paused = offer("Paused", 1);
        paused.status = OfferStatus::Paused;
        let offers = vec![offer("Live", 2), paused];

        let public = filter_offers(offers.clone(), &OfferQuery::default(), Some(OfferStatus::Active)).unwrap();
        assert_eq!(names(&public, |o| o.name.as_str()), vec!["Live"]);

        let admin = filter_offers(offers, &OfferQuery::default(), None).unwrap();
        assert_eq!(admin.total, 2);
    }

    #[test]
    fn search_and_array_filters_ignore_case() {
        let mut a = offer("Crypto Card", 1);
        a.tags = vec!["Fintech".to_owned()];
        a.geo_targets = vec!["US".to_owned()];
        let mut b = offer("Garden Tools", 2);
        b.description = "Fintech-free".to_owned();

        let query = OfferQuery {
            search: Some("fintech".to_owned()),
            geo: Some("us".to_owned()),
            ..OfferQuery::default()
        };
        let page = filter_offers(vec![a, b], &query, None).unwrap();
        assert_eq!(names(&page, |o| o.name.as_str()), vec!["Crypto Card"]);
    }

    #[test]
    fn payout_sort_puts_unknown_last() {
        let mut a = offer("A", 1);
        a.payout = Some(Decimal::new(500, 2));
        let b = offer("B", 2);
        let mut c = offer("C", 3);
        c.payout = Some(Decimal::new(1200, 2));

        let query = OfferQuery {
            sort: SortOrder::Payout,
            ..OfferQuery::default()
        };
        let page = filter_offers(vec![a, b, c], &query, None).unwrap();
        assert_eq!(names(&page, |o| o.name.as_str()), vec!["C", "A", "B"]);
    }

    #[test]
    fn newest_is_default_and_paging_slices() {
        let offers: Vec<Offer> = (0..5).map(|i| offer(&format!("o{i}"), i)).collect();
        let query = OfferQuery {
            page: Some(2),
            per_page: Some(2),
            ..OfferQuery::default()
        };
        let page = filter_offers(offers, &query, None).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(names(&page, |o| o.name.as_str()), vec!["o2", "o3"]);
    }

    #[test]
    fn paging_bounds_are_enforced() {
        assert_eq!(resolve_paging(None, None), Ok((1, DEFAULT_PER_PAGE)));
        assert_eq!(resolve_paging(Some(0), None), Err(BrowseError::InvalidPage));
        assert_eq!(resolve_paging(None, Some(101)), Err(BrowseError::InvalidPerPage));
        assert_eq!(resolve_paging(None, Some(0)), Err(BrowseError::InvalidPerPage));
    }

    #[test]
    fn bad_network_id_is_reported() {
        let query = OfferQuery {
            network_id: Some("nope".to_owned()),
            ..OfferQuery::default()
        };
        assert_eq!(
            filter_offers(Vec::new(), &query, None).unwrap_err(),
            BrowseError::InvalidNetworkId("nope".to_owned())
        );
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = paginate(vec![1, 2, 3], 5, 2);
        assert_eq!(page.total, 3);
        assert!(page.items.is_empty());
    }
}

//! Click analytics over recorded banner clicks.

use std::collections::{BTreeMap, BTreeSet};

use affiliate_types::{Banner, BannerClick, BannerClickCount, BannerId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Raw click rows returned when the query names no limit.
pub const DEFAULT_CLICK_LIMIT: usize = 100;

/// Most raw click rows returned by one query.
pub const MAX_CLICK_LIMIT: usize = 1_000;

/// Banners listed in a summary's `top_banners`.
pub const TOP_BANNERS: usize = 10;

/// Country bucket for clicks with no resolved country.
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Filter for raw click queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickFilter {
    /// Inclusive lower bound on `clicked_at`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `clicked_at`.
    pub until: Option<DateTime<Utc>>,
    /// Only clicks on this banner.
    pub banner_id: Option<BannerId>,
    /// Row cap, clamped to [`MAX_CLICK_LIMIT`].
    pub limit: Option<usize>,
}

impl ClickFilter {
    /// Return true when `click` falls inside the filter's window and banner.
    pub fn matches(&self, click: &BannerClick) -> bool {
        self.since.is_none_or(|s| click.clicked_at >= s)
            && self.until.is_none_or(|u| click.clicked_at < u)
            && self.banner_id.is_none_or(|b| click.banner_id == b)
    }

    /// The effective row cap.
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_CLICK_LIMIT)
            .clamp(1, MAX_CLICK_LIMIT)
    }
}

/// Clicks per country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    /// Country name, or `"unknown"`.
    pub country: String,
    /// Clicks from that country.
    pub clicks: usize,
}

/// Clicks per UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// The day.
    pub day: NaiveDate,
    /// Clicks on that day.
    pub clicks: usize,
}

/// Clicks per banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerCount {
    /// The banner.
    pub banner_id: BannerId,
    /// Clicks on it.
    pub clicks: usize,
}

/// Aggregate view over a set of clicks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClickSummary {
    /// Number of clicks.
    pub total_clicks: usize,
    /// Distinct users, falling back to IP when a click has no user id.
    pub unique_users: usize,
    /// Most clicks first.
    pub by_country: Vec<CountryCount>,
    /// Oldest day first.
    pub by_day: Vec<DayCount>,
    /// Most clicked banners, at most [`TOP_BANNERS`].
    pub top_banners: Vec<BannerCount>,
}

/// One row of the per-banner analytics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerClickRow {
    /// The banner.
    pub banner_id: BannerId,
    /// Banner display name.
    pub title: Option<String>,
    /// Banner image.
    pub image_url: String,
    /// Clicks recorded.
    pub clicks: i64,
    /// Distinct users.
    pub unique_users: i64,
    /// Most recent click.
    pub last_clicked_at: Option<DateTime<Utc>>,
}

/// Summarize a set of clicks.
pub fn summarize(clicks: &[BannerClick]) -> ClickSummary {
    let mut visitors = BTreeSet::new();
    let mut countries: BTreeMap<String, usize> = BTreeMap::new();
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut banners: BTreeMap<BannerId, usize> = BTreeMap::new();

    for click in clicks {
        let visitor = click
            .user_id
            .as_deref()
            .map(|u| format!("user:{u}"))
            .or_else(|| click.ip_address.as_deref().map(|ip| format!("ip:{ip}")));
        if let Some(visitor) = visitor {
            visitors.insert(visitor);
        }

        let country = click
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_COUNTRY);
        bump(countries.entry(country.to_owned()).or_default());
        bump(days.entry(click.clicked_at.date_naive()).or_default());
        bump(banners.entry(click.banner_id).or_default());
    }

    let mut by_country: Vec<CountryCount> = countries
        .into_iter()
        .map(|(country, clicks)| CountryCount { country, clicks })
        .collect();
    by_country.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.country.cmp(&b.country)));

    let mut top_banners: Vec<BannerCount> = banners
        .into_iter()
        .map(|(banner_id, clicks)| BannerCount { banner_id, clicks })
        .collect();
    top_banners.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.banner_id.cmp(&b.banner_id)));
    top_banners.truncate(TOP_BANNERS);

    ClickSummary {
        total_clicks: clicks.len(),
        unique_users: visitors.len(),
        by_country,
        by_day: days
            .into_iter()
            .map(|(day, clicks)| DayCount { day, clicks })
            .collect(),
        top_banners,
    }
}

/// Join stored click counts onto banners, zero-filling banners with no
/// clicks, most clicked first.
pub fn banner_table(banners: &[Banner], counts: &[BannerClickCount]) -> Vec<BannerClickRow> {
    let by_banner: BTreeMap<BannerId, &BannerClickCount> =
        counts.iter().map(|c| (c.banner_id, c)).collect();

    let mut rows: Vec<BannerClickRow> = banners
        .iter()
        .map(|banner| {
            let count = by_banner.get(&banner.id);
            BannerClickRow {
                banner_id: banner.id,
                title: banner.title.clone(),
                image_url: banner.image_url.clone(),
                clicks: count.map_or(0, |c| c.clicks),
                unique_users: count.map_or(0, |c| c.unique_users),
                last_clicked_at: count.and_then(|c| c.last_clicked_at),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.clicks
            .cmp(&a.clicks)
            .then_with(|| b.last_clicked_at.cmp(&a.last_clicked_at))
    });
    rows
}

/// Aggregate raw clicks into per-banner counts.
pub fn count_by_banner(clicks: &[BannerClick]) -> Vec<BannerClickCount> {
    let mut grouped: BTreeMap<BannerId, Vec<&BannerClick>> = BTreeMap::new();
    for click in clicks {
        grouped.entry(click.banner_id).or_default().push(click);
    }
    grouped
        .into_iter()
        .map(|(banner_id, rows)| {
            let visitors: BTreeSet<&str> = rows
                .iter()
                .filter_map(|c| c.user_id.as_deref().or(c.ip_address.as_deref()))
                .collect();
            BannerClickCount {
                banner_id,
                clicks: i64::try_from(rows.len()).unwrap_or(i64::MAX),
                unique_users: i64::try_from(visitors.len()).unwrap_or(i64::MAX),
                last_clicked_at: rows.iter().map(|c| c.clicked_at).max(),
            }
        })
        .collect()
}

fn bump(counter: &mut usize) {
    *counter = counter.saturating_add(1);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

    use affiliate_types::ClickId;
    use chrono::{Duration, TimeZone};

    use super::*;

    fn click(banner: BannerId, user: Option<&str>, ip: Option<&str>, country: Option<&str>, day: u32) -> BannerClick {
        BannerClick {
            id: ClickId::new(),
            banner_id: banner,
            user_id: user.map(str::to_owned),
            ip_address: ip.map(str::to_owned),
            country: country.map(str::to_owned),
            user_agent: None,
            clicked_at: Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn summary_buckets_and_orders() {
        let a = BannerId::new();
        let b = BannerId::new();
        let clicks = vec![
            click(a, Some("u1"), Some("1.1.1.1"), Some("Germany"), 2),
            click(a, Some("u1"), Some("1.1.1.1"), Some("Germany"), 1),
            click(b, None, Some("2.2.2.2"), None, 1),
            click(a, None, None, Some("France"), 2),
        ];

        let summary = summarize(&clicks);

        assert_eq!(summary.total_clicks, 4);
        assert_eq!(summary.unique_users, 2);
        assert_eq!(summary.by_country[0], CountryCount { country: "Germany".to_owned(), clicks: 2 });
        assert!(summary.by_country.iter().any(|c| c.country == UNKNOWN_COUNTRY));
        let days: Vec<u32> = summary.by_day.iter().map(|d| chrono::Datelike::day(&d.day)).collect();
        assert_eq!(days, vec![1, 2]);
        assert_eq!(summary.top_banners[0], BannerCount { banner_id: a, clicks: 3 });
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(summarize(&[]), ClickSummary::default());
    }

    #[test]
    fn table_zero_fills_unclicked_banners() {
        let now = Utc::now();
        let make = |title: &str| Banner {
            id: BannerId::new(),
            title: Some(title.to_owned()),
            image_url: "https://cdn.example.com/i.png".to_owned(),
            links: Vec::new(),
            sections: Vec::new(),
            expires_at: None,
            created_at: now,
        };
        let quiet = make("quiet");
        let busy = make("busy");
        let counts = vec![BannerClickCount {
            banner_id: busy.id,
            clicks: 9,
            unique_users: 4,
            last_clicked_at: Some(now),
        }];

        let rows = banner_table(&[quiet.clone(), busy.clone()], &counts);

        assert_eq!(rows[0].banner_id, busy.id);
        assert_eq!(rows[1].banner_id, quiet.id);
        assert_eq!(rows[1].clicks, 0);
    }

    #[test]
    fn filter_window_and_limit() {
        let a = BannerId::new();
        let c = click(a, None, None, None, 5);
        let filter = ClickFilter {
            since: Some(c.clicked_at),
            until: Some(c.clicked_at + Duration::seconds(1)),
            banner_id: Some(a),
            limit: Some(50_000),
        };
        assert!(filter.matches(&c));
        assert_eq!(filter.effective_limit(), MAX_CLICK_LIMIT);
        assert!(!ClickFilter { banner_id: Some(BannerId::new()), ..filter }.matches(&c));
    }

    #[test]
    fn counts_group_by_banner() {
        let a = BannerId::new();
        let clicks = vec![
            click(a, Some("u"), None, None, 1),
            click(a, Some("u"), None, None, 3),
        ];
        let counts = count_by_banner(&clicks);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].clicks, 2);
        assert_eq!(counts[0].unique_users, 1);
        assert_eq!(counts[0].last_clicked_at, Some(clicks[1].clicked_at));
    }
}

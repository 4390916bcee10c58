//! Spreadsheet import of offers.
//!
//! The dashboard parses the sheet and posts one JSON object per row, keyed
//! by the sheet's header cells. This module maps headers onto offer fields,
//! parses the loosely formatted cells, and validates each row as an
//! [`OfferDraft`]. Persisting the drafts is the caller's job.

use std::str::FromStr;

use affiliate_types::lists::{eq_folded, list_from_value};
use affiliate_types::{Network, NetworkId, OfferDraft, OfferId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::validate_offer;

/// Most rows accepted in one import request.
pub const MAX_IMPORT_ROWS: usize = 5_000;

/// A cell that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// The payout cell is not a number.
    #[error("invalid payout {0:?}")]
    InvalidPayout(String),

    /// The date cell is neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("invalid date {0:?}")]
    InvalidDate(String),

    /// The network cell names no known network.
    #[error("unknown network {0:?}")]
    UnknownNetwork(String),

    /// The request holds more rows than one import accepts.
    #[error("too many rows: {0} (max {MAX_IMPORT_ROWS})")]
    TooManyRows(usize),
}

/// An import request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportRequest {
    /// One object per sheet row, keyed by header.
    pub rows: Vec<Map<String, Value>>,
    /// Validate only, write nothing.
    #[serde(default)]
    pub dry_run: bool,
}

/// A row that failed to map or validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// 1-based row number within the request.
    pub row: usize,
    /// Everything wrong with the row.
    pub errors: Vec<String>,
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows received.
    pub total: usize,
    /// Rows written, or rows that would be written on a dry run.
    pub imported: usize,
    /// Rows rejected.
    pub failed: Vec<RowFailure>,
    /// Ids of created offers; empty on a dry run.
    pub offer_ids: Vec<OfferId>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Offer field a sheet column maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportField {
    /// `name`
    Name,
    /// `description`
    Description,
    /// `network_id`, by UUID or name
    Network,
    /// `tracking_url`
    TrackingUrl,
    /// `image_url`
    ImageUrl,
    /// `payout`
    Payout,
    /// `payout_type`
    PayoutType,
    /// `categories`
    Categories,
    /// `tags`
    Tags,
    /// `geo_targets`
    GeoTargets,
    /// `devices`
    Devices,
    /// `vertical`
    Vertical,
    /// `expires_at`
    ExpiresAt,
}

const ALIASES: &[(ImportField, &[&str])] = &[
    (ImportField::Name, &["name", "offer", "offername", "title"]),
    (ImportField::Description, &["description", "details"]),
    (ImportField::Network, &["network", "networkname", "networkid"]),
    (
        ImportField::TrackingUrl,
        &["trackingurl", "url", "link", "affiliatelink"],
    ),
    (ImportField::ImageUrl, &["image", "imageurl", "logo"]),
    (ImportField::Payout, &["payout", "commission", "rate"]),
    (ImportField::PayoutType, &["payouttype", "type", "model"]),
    (ImportField::Categories, &["categories", "category"]),
    (ImportField::Tags, &["tags", "tag"]),
    (
        ImportField::GeoTargets,
        &["geo", "geos", "countries", "geotargets"],
    ),
    (ImportField::Devices, &["devices", "device"]),
    (ImportField::Vertical, &["vertical", "verticals"]),
    (
        ImportField::ExpiresAt,
        &["expires", "expiresat", "expiry", "enddate"],
    ),
];

/// Map a header cell onto an offer field, ignoring case and separators.
pub fn field_for_header(header: &str) -> Option<ImportField> {
    let folded: String = header
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect();
    ALIASES
        .iter()
        .find(|(_, names)| names.contains(&folded.as_str()))
        .map(|(field, _)| *field)
}

/// Parse a payout cell such as `"$1,250.50"`, `"12"`, or `"€3.5"`.
pub fn parse_payout(raw: &str) -> Result<Decimal, ImportError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' '))
        .collect();
    Decimal::from_str(&cleaned).map_err(|_bad| ImportError::InvalidPayout(raw.to_owned()))
}

/// Parse a date cell: RFC 3339, or `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, ImportError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ImportError::InvalidDate(raw.to_owned()))
}

/// Resolve a network cell by UUID or case-insensitive name.
pub fn resolve_network(raw: &str, networks: &[Network]) -> Result<NetworkId, ImportError> {
    let trimmed = raw.trim();
    let found = trimmed.parse::<NetworkId>().map_or_else(
        |_not_uuid| {
            networks
                .iter()
                .find(|n| eq_folded(n.name.trim(), trimmed))
        },
        |id| networks.iter().find(|n| n.id == id),
    );
    found
        .map(|n| n.id)
        .ok_or_else(|| ImportError::UnknownNetwork(raw.to_owned()))
}

/// Check the request size before any row is mapped.
pub fn check_request(request: &ImportRequest) -> Result<(), ImportError> {
    if request.rows.len() > MAX_IMPORT_ROWS {
        return Err(ImportError::TooManyRows(request.rows.len()));
    }
    Ok(())
}

/// Map and validate one row into an offer draft.
///
/// Unknown headers are ignored. All problems in the row are collected.
pub fn map_row(row: &Map<String, Value>, networks: &[Network]) -> Result<OfferDraft, Vec<String>> {
    let mut draft = OfferDraft::default();
    let mut errors = Vec::new();

    for (header, value) in row {
        let Some(field) = field_for_header(header) else {
            continue;
        };
        match field {
            ImportField::Categories => draft.categories = list_from_value(value),
            ImportField::Tags => draft.tags = list_from_value(value),
            ImportField::GeoTargets => draft.geo_targets = list_from_value(value),
            ImportField::Devices => draft.devices = list_from_value(value),
            ImportField::Vertical => draft.vertical = list_from_value(value),
            scalar => {
                let Some(text) = cell_text(value) else {
                    continue;
                };
                if let Err(e) = set_scalar(&mut draft, scalar, text, networks) {
                    errors.push(e.to_string());
                }
            }
        }
    }

    if let Err(invalid) = validate_offer(&mut draft) {
        errors.extend(invalid.messages());
    }
    if errors.is_empty() { Ok(draft) } else { Err(errors) }
}

/// Map every row, splitting valid drafts from failures.
///
/// Drafts are returned with their 1-based row number.
pub fn map_rows(
    request: &ImportRequest,
    networks: &[Network],
) -> (Vec<(usize, OfferDraft)>, Vec<RowFailure>) {
    let mut drafts = Vec::new();
    let mut failed = Vec::new();
    for (row, index) in request.rows.iter().zip(1_usize..) {
        match map_row(row, networks) {
            Ok(draft) => drafts.push((index, draft)),
            Err(errors) => failed.push(RowFailure { row: index, errors }),
        }
    }
    (drafts, failed)
}

fn set_scalar(
    draft: &mut OfferDraft,
    field: ImportField,
    text: String,
    networks: &[Network],
) -> Result<(), ImportError> {
    match field {
        ImportField::Name => draft.name = text,
        ImportField::Description => draft.description = text,
        ImportField::TrackingUrl => draft.tracking_url = Some(text),
        ImportField::ImageUrl => draft.image_url = Some(text),
        ImportField::PayoutType => draft.payout_type = Some(text),
        ImportField::Payout => draft.payout = Some(parse_payout(&text)?),
        ImportField::ExpiresAt => draft.expires_at = Some(parse_date(&text)?),
        ImportField::Network => draft.network_id = Some(resolve_network(&text, networks)?),
        ImportField::Categories
        | ImportField::Tags
        | ImportField::GeoTargets
        | ImportField::Devices
        | ImportField::Vertical => {}
    }
    Ok(())
}

fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    fn network(name: &str) -> Network {
        let now = Utc::now();
        Network {
            id: NetworkId::new(),
            name: name.to_owned(),
            description: String::new(),
            logo_url: None,
            website_url: None,
            signup_url: None,
            categories: Vec::new(),
            tags: Vec::new(),
            geo_targets: Vec::new(),
            payment_methods: Vec::new(),
            payment_frequency: None,
            minimum_payout: None,
            commission_type: None,
            rating: None,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn headers_match_aliases_loosely() {
        assert_eq!(field_for_header("Offer Name"), Some(ImportField::Name));
        assert_eq!(field_for_header("affiliate_link"), Some(ImportField::TrackingUrl));
        assert_eq!(field_for_header("End-Date"), Some(ImportField::ExpiresAt));
        assert_eq!(field_for_header("GEOS"), Some(ImportField::GeoTargets));
        assert_eq!(field_for_header("unrelated"), None);
    }

    #[test]
    fn payout_cells_with_currency_and_grouping() {
        assert_eq!(parse_payout("$1,250.50").unwrap(), Decimal::new(125_050, 2));
        assert_eq!(parse_payout(" 12 ").unwrap(), Decimal::from(12));
        assert!(parse_payout("ten").is_err());
    }

    #[test]
    fn dates_accept_rfc3339_and_plain_days() {
        let d = parse_date("2025-12-31").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2025, 12, 31, 0));
        let t = parse_date("2025-12-31T10:30:00+02:00").unwrap();
        assert_eq!(t.hour(), 8);
        assert!(parse_date("31/12/2025").is_err());
    }

    #[test]
    fn networks_resolve_by_name_or_id() {
        let acme = network("Acme Ads");
        let networks = vec![acme.clone()];
        assert_eq!(resolve_network("acme ads", &networks).unwrap(), acme.id);
        assert_eq!(resolve_network(&acme.id.to_string(), &networks).unwrap(), acme.id);
        assert!(resolve_network("Other", &networks).is_err());
        assert!(resolve_network(&NetworkId::new().to_string(), &networks).is_err());
    }

    #[test]
    fn network_names_fold_beyond_ascii() {
        let aerzte = network("Ärzte Partner");
        let networks = vec![aerzte.clone()];
        assert_eq!(resolve_network(" ÄRZTE PARTNER ", &networks).unwrap(), aerzte.id);
        assert!(resolve_network("Arzte Partner", &networks).is_err());
    }

    #[test]
    fn full_row_maps_to_draft() {
        let acme = network("Acme");
        let cells = row(json!({
            "Offer Name": "Travel Card",
            "Network": "ACME",
            "Affiliate Link": "https://track.example.com/x",
            "Payout": "$45",
            "Payout Type": "CPA",
            "Countries": "US, CA",
            "Tags": ["travel", "Travel"],
            "Expiry": "2030-01-01",
            "Notes": "ignored column",
        }));
        let draft = map_row(&cells, &[acme.clone()]).unwrap();
        assert_eq!(draft.name, "Travel Card");
        assert_eq!(draft.network_id, Some(acme.id));
        assert_eq!(draft.payout, Some(Decimal::from(45)));
        assert_eq!(draft.geo_targets, vec!["US".to_owned(), "CA".to_owned()]);
        assert_eq!(draft.tags, vec!["travel".to_owned()]);
        assert!(draft.expires_at.is_some());
    }

    #[test]
    fn bad_rows_collect_every_error() {
        let cells = row(json!({
            "Payout": "lots",
            "Network": "Nobody",
        }));
        let errors = map_row(&cells, &[]).unwrap_err();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn rows_are_numbered_from_one() {
        let request = ImportRequest {
            rows: vec![row(json!({"name": "ok"})), row(json!({"name": ""}))],
            dry_run: true,
        };
        let (drafts, failed) = map_rows(&request, &[]);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].0, 1);
        assert_eq!(failed[0].row, 2);
    }
}

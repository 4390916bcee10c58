//! Lenient parsing and normalization of list-valued fields.
//!
//! Categories, tags, geo targets, devices, and verticals reach the backend
//! in several shapes: proper JSON arrays, JSON arrays encoded inside a
//! string, `PostgreSQL` array literals (`{a,b}`), or delimited strings
//! (`"a, b; c"`). They are parsed once here, at the write boundary, and
//! stored as plain `TEXT[]` columns from then on.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Characters accepted as separators in delimited list strings.
const DELIMITERS: &[char] = &[',', ';', '|', '\n'];

/// Parse a list from a raw text cell.
///
/// Accepts a JSON-encoded array, a `PostgreSQL` array literal, or a
/// delimited string. The result is normalized with [`normalize`].
pub fn parse_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[')
        && let Ok(items) = serde_json::from_str::<Vec<Value>>(trimmed)
    {
        return normalize(items.iter().filter_map(scalar_text));
    }

    let body = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);

    normalize(
        body.split(DELIMITERS)
            .map(|item| item.trim().trim_matches('"').to_owned()),
    )
}

/// Convert an arbitrary JSON value into a normalized list.
///
/// Arrays contribute their scalar members, strings go through
/// [`parse_list`], numbers become their decimal text, and everything else
/// yields an empty list.
pub fn list_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => normalize(items.iter().filter_map(scalar_text)),
        Value::String(s) => parse_list(s),
        Value::Number(n) => normalize([n.to_string()]),
        Value::Bool(_) | Value::Null | Value::Object(_) => Vec::new(),
    }
}

/// Compare two values the way every directory filter does: Unicode
/// lowercase, character by character.
pub fn eq_folded(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Trim every entry, drop empties, and drop case-insensitive duplicates.
///
/// The first spelling of a duplicated value wins and order is preserved.
pub fn normalize<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let entry = item.as_ref().trim();
        if entry.is_empty() {
            continue;
        }
        if out.iter().any(|seen| eq_folded(seen, entry)) {
            continue;
        }
        out.push(entry.to_owned());
    }
    out
}

/// Return true when `list` contains `needle`, ignoring case.
pub fn contains_ignore_case(list: &[String], needle: &str) -> bool {
    let needle = needle.trim();
    list.iter().any(|entry| eq_folded(entry, needle))
}

/// Serde adapter for list fields that may arrive in any legacy shape.
///
/// Use with `#[serde(default, deserialize_with = "lenient_list")]`.
pub fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(list_from_value(&value))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn folding_handles_non_ascii_letters() {
        assert!(eq_folded("ÄRZTE", "ärzte"));
        assert!(!eq_folded("Ärzte", "Arzte"));
        assert_eq!(normalize(["Über", "über", " ÜBER "]), vec!["Über"]);
        assert!(contains_ignore_case(&[String::from("Österreich")], "ÖSTERREICH"));
    }

    #[test]
    fn parses_every_legacy_shape() {
        let expected = vec!["Finance".to_owned(), "Crypto".to_owned()];
        assert_eq!(parse_list("Finance, Crypto"), expected);
        assert_eq!(parse_list("Finance;Crypto"), expected);
        assert_eq!(parse_list(r#"["Finance","Crypto"]"#), expected);
        assert_eq!(parse_list(r#"{"Finance",Crypto}"#), expected);
        assert_eq!(list_from_value(&serde_json::json!(["Finance", "Crypto"])), expected);
    }

    #[test]
    fn normalization_drops_blanks_and_duplicates() {
        assert_eq!(
            parse_list(" US ,, us , CA ,"),
            vec!["US".to_owned(), "CA".to_owned()]
        );
        assert!(parse_list("   ").is_empty());
        assert!(list_from_value(&Value::Null).is_empty());
    }

    #[test]
    fn malformed_json_falls_back_to_delimiters() {
        assert_eq!(parse_list("[a, b"), vec!["[a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn lenient_list_deserializes_strings_and_arrays() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "lenient_list")]
            tags: Vec<String>,
        }

        let a: Row = serde_json::from_str(r#"{"tags": "a|b"}"#).unwrap();
        let b: Row = serde_json::from_str(r#"{"tags": ["a", "b", "A"]}"#).unwrap();
        let c: Row = serde_json::from_str(r"{}").unwrap();
        assert_eq!(a.tags, b.tags);
        assert!(c.tags.is_empty());
    }

    #[test]
    fn contains_ignores_case() {
        let list = vec!["Mobile".to_owned()];
        assert!(contains_ignore_case(&list, "mobile"));
        assert!(!contains_ignore_case(&list, "desktop"));
    }
}

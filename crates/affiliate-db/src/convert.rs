//! Conversions between column values and Rust domain types.

use std::str::FromStr;

use crate::error::DbError;

/// Parse a `TEXT` column into an enum.
pub fn parse_text<T>(table: &'static str, raw: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| DbError::corrupt(table, e.to_string()))
}

/// Parse a `TEXT[]` column into enums.
pub fn parse_text_list<T>(table: &'static str, raw: &[String]) -> Result<Vec<T>, DbError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.iter().map(|s| parse_text(table, s)).collect()
}

/// `BIGINT` millisecond column to `u64`.
pub fn millis_from_db(table: &'static str, raw: i64) -> Result<u64, DbError> {
    u64::try_from(raw).map_err(|_negative| DbError::corrupt(table, format!("negative duration {raw}")))
}

/// `u64` milliseconds to a `BIGINT` bind value, saturating.
pub fn millis_to_db(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

/// `usize` row cap to a `BIGINT` bind value, saturating.
pub fn limit_to_db(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

//! Time remaining until an offer, banner, or rotation expires.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Remaining time split into display components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    /// Whole seconds remaining, zero once expired.
    pub total_seconds: i64,
    /// Whole days remaining.
    pub days: i64,
    /// Hours within the current day.
    pub hours: i64,
    /// Minutes within the current hour.
    pub minutes: i64,
    /// Seconds within the current minute.
    pub seconds: i64,
    /// True when `expires_at <= now`.
    pub expired: bool,
}

impl Countdown {
    /// Compute the countdown from `now` to `expires_at`.
    pub fn until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if expires_at <= now {
            return Self::EXPIRED;
        }
        let total = expires_at.signed_duration_since(now).num_seconds();
        Self {
            total_seconds: total,
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
            expired: false,
        }
    }

    /// Countdown for an optional expiry; `None` means it never expires.
    pub fn for_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Self> {
        expires_at.map(|at| Self::until(at, now))
    }

    const EXPIRED: Self = Self {
        total_seconds: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        expired: true,
    };
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expired {
            return f.write_str("expired");
        }
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// A record paired with the countdown to its expiry.
///
/// Serializes as the record's own fields plus `countdown` when the record
/// has an expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithCountdown<T> {
    /// The wrapped record.
    #[serde(flatten)]
    pub item: T,
    /// Time remaining, absent when the record never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<Countdown>,
}

impl<T> WithCountdown<T> {
    /// Pair `item` with the countdown to `expires_at`.
    pub fn new(item: T, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self {
            item,
            countdown: Countdown::for_expiry(expires_at, now),
        }
    }
}

//! Calendar-day helpers over UTC timestamps.

use chrono::{DateTime, Duration, Utc};

/// Truncate a timestamp to midnight of its calendar day.
pub fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|n| n.and_utc())
        .unwrap_or(dt)
}

/// Whether two timestamps fall on the same calendar day.
pub fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

pub fn is_today(dt: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    same_day(dt, now)
}

pub fn is_tomorrow(dt: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    dt.date_naive() == now.date_naive() + Duration::days(1)
}

/// Strictly in the past as an instant, and not on today's calendar day.
/// A deadline earlier today is "due today", not past.
pub fn is_past_day(dt: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    dt < now && !same_day(dt, now)
}

/// Whole days between two instants (truncated toward zero).
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days()
}

pub fn add_days(dt: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    dt + Duration::days(days)
}

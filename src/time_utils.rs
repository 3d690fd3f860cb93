// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and month arithmetic.

use chrono::{DateTime, Datelike, Months, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// First instant (00:00:00 UTC on day 1) of the month `months_back` months
/// before the month containing `now`.
pub fn month_start(now: DateTime<Utc>, months_back: u32) -> DateTime<Utc> {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
    let target = first.checked_sub_months(Months::new(months_back)).unwrap_or(first);
    Utc.from_utc_datetime(&target.and_time(chrono::NaiveTime::MIN))
}

/// Three-letter English month abbreviation ("Jan" .. "Dec").
pub fn month_label(date: DateTime<Utc>) -> String {
    date.format("%b").to_string()
}

/// Same day next calendar month, clamped to the last day for short months.
pub fn one_month_after(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(1)).unwrap_or(date)
}

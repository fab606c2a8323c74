// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-readable date and time, e.g. "Monday, March 02, 2026 at 14:30 UTC".
pub fn format_human_utc(date: DateTime<Utc>) -> String {
    date.format("%A, %B %d, %Y at %H:%M UTC").to_string()
}

/// Whole minutes between two instants (negative spans clamp to zero).
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}

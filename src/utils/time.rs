use chrono::{DateTime, Datelike, Utc};

/// `floor(unix_seconds / 60)` — the quantum of per-minute rate limiting.
pub fn minute_epoch(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(60)
}

/// UTC calendar year and month, decimal, unpadded (e.g. `2025-3`). Pinned as
/// part of the spec: a zero-padded or ISO variant would silently split a
/// month's counters across two key formats.
pub fn month_label(now: DateTime<Utc>) -> String {
    format!("{}-{}", now.year(), now.month())
}

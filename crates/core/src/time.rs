// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp and interval handling.
//!
//! All timestamps are nanoseconds since the Unix epoch, all intervals are
//! nanosecond counts. Zero means "unknown".

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Nanoseconds since the Unix epoch. Zero is "unknown".
pub type Timestamp = u64;

/// Nanosecond interval. Zero is "unknown".
pub type Interval = u64;

pub const NS_PER_SEC: u64 = 1_000_000_000;

const SECS_PER_MIN: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MIN;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const SECS_PER_YEAR: u64 = 365 * SECS_PER_DAY;

/// Current time as a [`Timestamp`].
pub fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Render a timestamp as `YYYY-MM-DD hh:mm:ss +0000`.
pub fn format_datetime(ts: Timestamp) -> String {
    let secs = (ts / NS_PER_SEC) as i64;
    let nanos = (ts % NS_PER_SEC) as u32;
    let dt: DateTime<Utc> = DateTime::from_timestamp(secs, nanos).unwrap_or_default();
    dt.format("%Y-%m-%d %H:%M:%S %z").to_string()
}

/// Render an interval as a compact human-readable duration (`0s`, `90s` as
/// `1m30s`, `5400s` as `1h30m`). Sub-second intervals render as `0s`.
pub fn format_interval(interval: Interval) -> String {
    let mut secs = interval / NS_PER_SEC;
    if secs == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, label) in [
        (SECS_PER_YEAR, "y"),
        (SECS_PER_DAY, "d"),
        (SECS_PER_HOUR, "h"),
        (SECS_PER_MIN, "m"),
        (1, "s"),
    ] {
        let n = secs / unit;
        if n > 0 {
            out.push_str(&n.to_string());
            out.push_str(label);
            secs -= n * unit;
        }
    }
    out
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;

//! Timestamp conversions and calendar naming

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Nanoseconds since the Unix epoch, as the query API expects them.
///
/// Saturates outside the representable range (roughly 1677..2262).
pub fn to_unix_nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap_or(if ts.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Parse a nanosecond epoch string as returned in query results
pub fn parse_unix_nanos(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim().parse::<i64>().ok().map(|ns| Utc.timestamp_nanos(ns))
}

/// Month directory name, e.g. `05-2024`
pub fn month_dir_name<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    format!("{:02}-{:04}", ts.month(), ts.year())
}

/// Daily output file name, e.g. `log-05-21-2024.txt`
pub fn day_file_name<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    format!("log-{:02}-{:02}-{:04}.txt", ts.month(), ts.day(), ts.year())
}

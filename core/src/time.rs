//! Time related utils.

use crate::{Error, Result};
use chrono::{NaiveDateTime, SecondsFormat, Timelike, Utc};

/// DateTime is the alias of `chrono::DateTime<Utc>`.
pub type DateTime = chrono::DateTime<Utc>;

/// Create a new DateTime with the current time, truncated to whole seconds.
pub fn now() -> DateTime {
    truncate_to_seconds(Utc::now())
}

/// Drop the sub-second part of a time.
pub fn truncate_to_seconds(t: DateTime) -> DateTime {
    // with_nanosecond(0) is always in range.
    t.with_nanosecond(0).unwrap_or(t)
}

/// Format time into date: `20220301`
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Format time into ISO8601: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format time into RFC3339 with millisecond precision: `2022-03-13T07:20:04.000Z`
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse time from ISO8601: `20220313T072004Z`
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    let t = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ").map_err(|e| {
        Error::request_invalid(format!("invalid ISO8601 timestamp: {s}")).with_source(e)
    })?;
    Ok(t.and_utc())
}

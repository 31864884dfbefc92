//! Time utilities: deadlines, display formats and timezone conversion.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse a deadline like "2025-03-10".
pub fn parse_deadline(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid deadline '{s}': {e} (expected YYYY-MM-DD)"))
}

/// Parse an IANA timezone name like "America/Chicago".
pub fn parse_tz(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Resolve a local wall-clock time in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times skipped by a
/// DST jump are an error.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    let local_dt = tz
        .from_local_datetime(&local)
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("invalid local time (DST gap?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Medium date style, e.g. "Mar 10, 2025".
pub fn medium_date(d: NaiveDate) -> String {
    d.format("%b %-d, %Y").to_string()
}

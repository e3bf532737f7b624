use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, Result};

/// Naive formats accepted after RFC 3339, interpreted in the local zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a client-supplied instant.
///
/// RFC 3339 carries its own offset. Naive date-times and bare dates are
/// local to `tz`; a local time skipped by a DST jump is rejected.
pub fn parse_instant(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| AppError::BadRequest(format!("invalid timestamp '{s}'")))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::BadRequest(format!("'{s}' does not exist in {tz}")))
}

/// `raw` parsed with [`parse_instant`], or now when absent/empty.
pub fn instant_or_now(raw: Option<&str>, tz: Tz) -> Result<DateTime<Utc>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_instant(s, tz),
        None => Ok(Utc::now()),
    }
}

/// Hour of day (0-23) of `at` on the wall clock of `tz`.
pub fn local_hour(at: DateTime<Utc>, tz: Tz) -> u32 {
    at.with_timezone(&tz).hour()
}

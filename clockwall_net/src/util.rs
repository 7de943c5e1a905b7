use chrono::{DateTime, NaiveDateTime};

use crate::error::{NetError, Result};

/// Obsolete `Date` forms servers may still send; both are always GMT.
const OBSOLETE_HTTP_DATES: [&str; 2] = [
    // RFC 850: Sunday, 06-Nov-94 08:49:37 GMT
    "%A, %d-%b-%y %T GMT",
    // asctime: Sun Nov  6 08:49:37 1994
    "%a %b %e %T %Y",
];

/// Parse an HTTP `Date` header (IMF-fixdate, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`)
/// into Unix epoch milliseconds. The RFC 850 and asctime forms are accepted too.
pub fn parse_http_date(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let err = match DateTime::parse_from_rfc2822(trimmed) {
        Ok(dt) => return Ok(dt.timestamp_millis() as f64),
        Err(e) => e,
    };
    OBSOLETE_HTTP_DATES
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis() as f64)
        .ok_or_else(|| NetError::Malformed(format!("{raw:?}: {err}")))
}

/// Parse an RFC 3339 datetime (e.g. `2024-03-01T12:00:00.123456+00:00`) into
/// Unix epoch milliseconds, keeping sub-millisecond precision.
pub fn parse_utc_datetime(raw: &str) -> Result<f64> {
    let dt = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| NetError::Malformed(format!("{raw:?}: {e}")))?;
    let micros = dt.timestamp_micros();
    Ok(micros as f64 / 1000.0)
}

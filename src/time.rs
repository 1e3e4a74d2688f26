//! Conversions between POSIX-second timestamps and calendar time.
//!
//! Internally all times are `f64` seconds since 1970-01-01T00:00:00Z. Output
//! uses ISO-8601 with microseconds and a `Z` suffix, e.g.
//! `2019-07-04T17:33:49.010000Z`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Calendar time of a timestamp, rounded to the microsecond.
pub fn to_datetime(t: f64) -> Option<DateTime<Utc>> {
    if !t.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_micros((t * 1e6).round() as i64)
}

/// Timestamp of a calendar time.
pub fn from_datetime(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 * 1e-9
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
///
/// Timestamps outside the representable calendar range fall back to the
/// plain number of seconds.
pub fn format_time(t: f64) -> String {
    match to_datetime(t) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
        None => format!("{}", t),
    }
}

/// Parse an RFC 3339 timestamp, a zone-less `YYYY-MM-DDTHH:MM:SS[.f]`
/// (taken as UTC), or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_time(s: &str) -> anyhow::Result<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(from_datetime(&dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(from_datetime(&naive.and_utc()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(from_datetime(&midnight.and_utc()));
        }
    }
    anyhow::bail!("unrecognized time format: {:?}", s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_time(0.0), "1970-01-01T00:00:00.000000Z");
        assert_eq!(format_time(1562261629.01), "2019-07-04T17:33:49.010000Z");
        assert_eq!(format_time(f64::NAN), "NaN");
    }

    #[test]
    fn test_parse() {
        let t = parse_time("2019-07-04T17:33:49.01Z").unwrap();
        assert!((t - 1562261629.01).abs() < 1e-6);
        let t = parse_time("2019-07-04T17:33:49.01").unwrap();
        assert!((t - 1562261629.01).abs() < 1e-6);
        assert_eq!(parse_time("2019-07-04").unwrap(), 1562198400.0);
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn test_format_parse_agree() {
        let t = 1_700_000_123.456789;
        let back = parse_time(&format_time(t)).unwrap();
        assert!((back - t).abs() < 1e-6);
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Parse a Jira timestamp.
///
/// Accepts RFC 3339 (`2024-01-15T10:30:00Z`), Jira's own offset form without a
/// colon (`2024-01-15T10:30:00.000+0000`), an offset-less datetime (taken as
/// UTC) and a bare date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of millisecond durations, expressed in whole days (nearest integer).
/// Returns 0 for an empty slice.
pub fn mean_days(durations_ms: &[i64]) -> i64 {
    if durations_ms.is_empty() {
        return 0;
    }
    let total: i64 = durations_ms.iter().sum();
    let mean = total as f64 / durations_ms.len() as f64;
    (mean / MILLIS_PER_DAY).round() as i64
}

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::errors::VeracodeError;

/// Format of `published_date` on summary reports, e.g. `2016-11-08 10:18:15 UTC`.
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Strict parse of a summary report timestamp; the value is always UTC.
pub fn parse_report_timestamp(value: &str) -> Result<DateTime<Utc>, VeracodeError> {
    NaiveDateTime::parse_from_str(value.trim(), REPORT_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| VeracodeError::InvalidTimestamp {
            value: value.to_string(),
            format: REPORT_TIMESTAMP_FORMAT,
        })
}

/// Best-effort parse of a build list `policy_updated_date`.
///
/// Accepts RFC 3339 / RFC 2822, a handful of ISO and US layouts, and a trailing
/// `UTC` designator. Values without an offset are taken as local time.
pub fn parse_lenient(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    if let Some(utc) = value.strip_suffix("UTC") {
        return parse_naive(utc.trim()).map(|naive| naive.and_utc().fixed_offset());
    }

    parse_naive(value).and_then(|naive| {
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.fixed_offset())
    })
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

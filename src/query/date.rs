//! Date value normalization
//!
//! Date clauses and histogram bounds accept RFC 3339 timestamps,
//! `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or epoch milliseconds.

use crate::error::DslError;
use crate::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date value into a UTC timestamp
pub fn parse_date(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or_else(|| DslError::InvalidDate(n.to_string())),
        other => Err(DslError::InvalidDate(other.to_string())),
    }
}

fn parse_date_str(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| DslError::InvalidDate(s.to_string()))
}

/// Epoch milliseconds of a date value
pub fn to_epoch_millis(value: &Value) -> Result<i64> {
    Ok(parse_date(value)?.timestamp_millis())
}

/// Date math expression rounding a date value down to its day, e.g. `2024-03-01||/d`
///
/// Timestamps with an offset keep the calendar day written in that offset.
pub fn day_math(value: &Value) -> Result<String> {
    let day = match value {
        Value::String(s) => match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(local) => local.date_naive(),
            Err(_) => parse_date_str(s.trim())?.date_naive(),
        },
        other => parse_date(other)?.date_naive(),
    };
    Ok(format!("{}||/d", day.format(DATE_FORMAT)))
}

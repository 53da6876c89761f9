//! Tolerant date/time converters for envelope payloads.
//!
//! Backends serialize timestamps in several shapes depending on server
//! culture settings. These helpers normalize all of them to UTC:
//!
//! - RFC 3339 with offset (`2024-03-01T10:00:00+02:00`)
//! - ISO local time without offset (`2024-03-01T10:00:00.123`), read as UTC
//! - space separated (`2024-03-01 10:00:00`)
//! - date only (`2024-03-01`), read as midnight UTC
//! - legacy JSON dates (`/Date(1709287200000)/`)
//!
//! # Example
//!
//! ```
//! use chrono::{DateTime, Utc};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Order {
//!     #[serde(with = "odata_client::datetime")]
//!     created: DateTime<Utc>,
//!     #[serde(default, with = "odata_client::datetime::option")]
//!     shipped: Option<DateTime<Utc>>,
//! }
//!
//! let order: Order = serde_json::from_str(r#"{"created":"2024-03-01 10:00:00","shipped":null}"#).unwrap();
//! assert_eq!(order.created.to_rfc3339(), "2024-03-01T10:00:00+00:00");
//! assert!(order.shipped.is_none());
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses any supported timestamp shape into UTC.
pub fn parse(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Some(millis) = parse_legacy(input) {
        return DateTime::from_timestamp_millis(millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Extracts milliseconds from `/Date(ms)/` or `/Date(ms+hhmm)/`.
fn parse_legacy(input: &str) -> Option<i64> {
    let inner = input.strip_prefix("/Date(")?.strip_suffix(")/")?;
    if inner.is_empty() {
        return None;
    }
    // The first character may be a sign; an offset starts at a later sign.
    let end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| matches!(c, '+' | '-'))
        .map(|(i, _)| i)
        .unwrap_or(inner.len());
    inner[..end].parse().ok()
}

/// Deserializes a required timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("unrecognized date/time: {raw}")))
}

/// Serializes as RFC 3339 with a `Z` suffix.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Converters for optional timestamps; `null` and empty strings map to `None`.
pub mod option {
    use super::*;

    /// Deserializes an optional timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("unrecognized date/time: {s}"))),
        }
    }

    /// Serializes an optional timestamp.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => super::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }
}

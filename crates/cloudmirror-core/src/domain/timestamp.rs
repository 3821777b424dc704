//! Timestamp parsing for persisted JSON
//!
//! Ledgers and catalog indexes written by the upload side carry ISO-8601
//! timestamps without an offset (`2025-01-02T10:11:12.123456`), taken from
//! the writer's local clock. Everything cloudmirror writes is RFC 3339 in
//! UTC. The deserializers here accept both; serialization is left to
//! chrono's RFC 3339 default.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an RFC 3339 timestamp, or an offset-less ISO-8601 one read as
/// local time
///
/// A local time that does not exist (DST gap) is read as UTC.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;
    let at = Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive));
    Some(at)
}

/// `deserialize_with` helper for `DateTime<Utc>` fields
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}

/// `deserialize_with` helper for `Option<DateTime<Utc>>` fields
///
/// `null` and a missing field both become `None`; pair with `#[serde(default)]`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}"))),
    }
}

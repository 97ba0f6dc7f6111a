//! Decoding of timestamps received from stations.
//!
//! Stations send RFC 3339 values, but records read back from a station's own
//! database often carry no offset (`2025-03-01T08:00:00`). Those are taken as
//! UTC.
//!
//! Stored timestamps are compared as text, which only orders correctly for
//! four-digit years, so anything outside 0001..=9999 is refused at decode time.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Whether `ts` survives the fixed-width text encoding with its order intact.
pub fn in_storable_range(ts: &DateTime<Utc>) -> bool {
    (1..=9999).contains(&ts.year())
}

/// Parses an RFC 3339 or offset-less timestamp.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| naive.and_utc())
        })
        .ok_or_else(|| format!("invalid timestamp '{}'", raw))?;

    if !in_storable_range(&parsed) {
        return Err(format!("timestamp '{}' is outside years 0001-9999", raw));
    }

    Ok(parsed)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(D::Error::custom)
}

pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse(&raw).map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Stands in for an absent `createdAt` until the record's `updatedAt` is known.
pub(crate) fn unset() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

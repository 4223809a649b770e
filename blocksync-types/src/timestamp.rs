//! Strict ISO-8601 timestamp decoding for the block service wire format.
//!
//! The service emits timestamps with and without fractional seconds, with an
//! explicit offset or as bare UTC. Anything else fails decode — an
//! unrecognized date is surfaced as an error, never replaced with a guess.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Raised when a wire timestamp matches none of the accepted shapes.
#[derive(Debug, Error)]
#[error("unrecognized timestamp format: {0:?}")]
pub struct TimestampError(pub String);

/// Parses an ISO-8601 timestamp, with or without fractional seconds.
///
/// Accepts RFC 3339 (`2025-03-01T09:30:00.123456Z`, `2025-03-01T09:30:00+02:00`)
/// and bare date-times without an offset, which are taken as UTC.
pub fn parse(s: &str) -> Result<DateTime<Utc>, TimestampError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // `%.f` matches an optional fractional-second suffix.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(TimestampError(s.to_string()))
}

/// Serde adapter for `Option<DateTime<Utc>>` fields using [`parse`].
pub mod option {
    use super::parse;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => parse(&s).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

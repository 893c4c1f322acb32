//! Instant normalization.
//!
//! All stored instants are naive UTC. Anything that arrives with a zone or
//! offset is converted to UTC and stripped before comparison or persistence.

use chrono::{DateTime, NaiveDateTime};

/// Parse an ISO-8601 instant from a request, normalizing to naive UTC.
///
/// Accepts RFC 3339 with an offset (`2025-01-06T09:00:00+02:00`), a `Z`
/// suffix, or a bare naive instant with either `T` or space separator.
pub fn parse_instant(raw: &str) -> Result<NaiveDateTime, String> {
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Ok(aware.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive);
        }
    }
    Err(format!("Invalid datetime: {raw}"))
}

/// Serde adapter for request fields that must accept both offset-aware and
/// naive instants.
pub mod flexible_instant {
    use super::parse_instant;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_instant(&raw).map_err(serde::de::Error::custom)
    }
}

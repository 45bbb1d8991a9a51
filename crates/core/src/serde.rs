//! Serde helpers for raw form payloads.
//!
//! Form inputs submit untouched fields as empty strings, so optional
//! fields treat blank input as `None`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Deserialize an optional string, treating blank strings as None.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_to_none(Option::deserialize(deserializer)?))
}

/// Deserialize an optional `YYYY-MM-DD` date, treating blank strings as None.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_to_none(Option::deserialize(deserializer)?)
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Deserialize an optional reference id, treating blank strings and the
/// `"none"` select option as None.
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_to_none(Option::deserialize(deserializer)?)
        .filter(|s| !s.trim().eq_ignore_ascii_case("none"))
        .map(|s| Uuid::parse_str(s.trim()))
        .transpose()
        .map_err(serde::de::Error::custom)
}

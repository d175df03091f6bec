//! Forgiving deserializers for backend snapshot fields.
//!
//! The backend merges two hand-edited YAML files, so any field can be
//! missing, `null`, or of an unexpected type. None of these helpers fail:
//! a value that cannot be understood becomes the field's empty default.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Parse a backend timestamp.
///
/// Accepts RFC 3339, RFC 2822 (what Flask's `jsonify` emits for datetimes)
/// and naive `YYYY-MM-DDTHH:MM:SS[.fff]` values, which are local wall-clock
/// time. A naive time that falls in a DST gap is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| {
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc))
        })
}

pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

/// Render a scalar as a string; numbers keep their JSON spelling.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Required identifier: strings and numbers are accepted, anything else fails
/// so the enclosing element can be dropped by [`vec`].
pub(crate) fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    match raw {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty()))
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(scalar_to_string).unwrap_or_default())
}

pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        // A single dependency written as a bare scalar.
        Some(ref scalar @ (Value::String(_) | Value::Number(_))) => {
            scalar_to_string(scalar).into_iter().collect()
        }
        _ => Vec::new(),
    })
}

pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0))
}

/// Step numbers run 1..=5; larger values clamp to 5, zero or junk is absent.
pub(crate) fn step<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_u64)
        .filter(|n| *n >= 1)
        .map(|n| n.min(5) as u8))
}

/// Deserialize a list element by element, dropping elements that do not parse.
pub(crate) fn vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = raw else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed snapshot element");
                None
            }
        })
        .collect())
}

pub(crate) fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v).ok()))
}

/// Task id → elapsed seconds; non-numeric entries are dropped.
pub(crate) fn durations<'de, D>(deserializer: D) -> Result<HashMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = raw else {
        return Ok(HashMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(id, secs)| secs.as_f64().map(|s| (id, s)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2024-03-01T10:15:00Z").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.minute(), 15);
    }

    #[test]
    fn test_parse_timestamp_with_offset_normalises_to_utc() {
        let ts = parse_timestamp("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_parse_timestamp_naive_is_local_time() {
        let expected = Local
            .with_ymd_and_hms(2024, 5, 1, 11, 15, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_timestamp("2024-05-01T11:15:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01 11:15:00"), Some(expected));

        let ts = parse_timestamp("2024-03-01T10:15:30.250").unwrap();
        let local = ts.with_timezone(&Local);
        assert_eq!((local.hour(), local.minute(), local.second()), (10, 15, 30));
        assert_eq!(local.day(), 1);
    }

    #[test]
    fn test_parse_timestamp_http_date() {
        let ts = parse_timestamp("Wed, 18 Feb 2015 23:16:09 GMT").unwrap();
        assert_eq!(ts.year(), 2015);
        assert_eq!(ts.hour(), 23);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}

//! Small extraction helpers for reading the platform's raw JSON DTOs.
//! The wire format is consumed as `serde_json::Value` throughout (the
//! `raw` column stores exactly that), rather than through a typed
//! Deserialize struct per endpoint - the payloads are too ad hoc and
//! partial (mentions, partial users) for a single rigid shape.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{ArchiveError, ArchiveResult};

/// Reads a required snowflake field (Discord sends these as JSON strings
/// to dodge floating-point truncation in JS clients).
pub fn required_id(value: &Value, field: &str) -> ArchiveResult<i64> {
    optional_id(value, field)?.ok_or_else(|| {
        ArchiveError::DataShape(format!("missing required field `{field}`"))
    })
}

pub fn optional_id(value: &Value, field: &str) -> ArchiveResult<Option<i64>> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|e| ArchiveError::DataShape(format!("field `{field}` is not a snowflake: {e}"))),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ArchiveError::DataShape(format!("field `{field}` overflows i64"))),
        Some(_) => Err(ArchiveError::DataShape(format!(
            "field `{field}` has unexpected type"
        ))),
    }
}

pub fn required_str<'a>(value: &'a Value, field: &str) -> ArchiveResult<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ArchiveError::DataShape(format!("missing required field `{field}`")))
}

pub fn optional_str(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(String::from)
}

pub fn optional_bool(value: &Value, field: &str) -> Option<bool> {
    value.get(field).and_then(Value::as_bool)
}

pub fn bool_or(value: &Value, field: &str, default: bool) -> bool {
    optional_bool(value, field).unwrap_or(default)
}

pub fn optional_i64_number(value: &Value, field: &str) -> Option<i64> {
    value.get(field).and_then(Value::as_i64)
}

pub fn i64_or(value: &Value, field: &str, default: i64) -> i64 {
    optional_i64_number(value, field).unwrap_or(default)
}

pub fn optional_i32(value: &Value, field: &str) -> Option<i32> {
    value.get(field).and_then(Value::as_i64).map(|n| n as i32)
}

pub fn i32_or(value: &Value, field: &str, default: i32) -> i32 {
    optional_i32(value, field).unwrap_or(default)
}

pub fn optional_f64(value: &Value, field: &str) -> Option<f64> {
    value.get(field).and_then(Value::as_f64)
}

/// Parses Discord's ISO8601 timestamps (always UTC, `Z` or `+00:00`
/// suffixed) into a timezone-aware UTC instant.
pub fn parse_iso8601(raw: &str) -> ArchiveResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ArchiveError::DataShape(format!("invalid timestamp `{raw}`: {e}")))
}

pub fn optional_iso8601(value: &Value, field: &str) -> ArchiveResult<Option<DateTime<Utc>>> {
    match value.get(field).and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) => parse_iso8601(raw).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_snowflake() {
        let data = json!({"id": "175928847299117063"});
        assert_eq!(required_id(&data, "id").unwrap(), 175_928_847_299_117_063);
    }

    #[test]
    fn missing_required_field_is_a_data_shape_error() {
        let data = json!({});
        assert!(matches!(
            required_id(&data, "id"),
            Err(ArchiveError::DataShape(_))
        ));
    }

    #[test]
    fn parses_zulu_and_offset_timestamps_to_the_same_instant() {
        let zulu = parse_iso8601("2023-01-01T12:00:00.000000+00:00").unwrap();
        let offset = parse_iso8601("2023-01-01T12:00:00+00:00").unwrap();
        assert_eq!(zulu.timestamp(), offset.timestamp());
    }
}

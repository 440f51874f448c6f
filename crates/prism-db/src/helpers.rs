//! Row parsing and parameter helpers shared by the store modules.

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::Value;
use prism_core::enums::Perspective;

use crate::error::DatabaseError;

/// Render a timestamp in the stored form: UTC, microseconds, trailing `Z`.
///
/// Every stored date has the same width, so SQL text comparison and index
/// order agree with chronological order.
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not RFC 3339.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a present value cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    s.map(parse_datetime).transpose()
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Parse an optional enum column.
///
/// # Errors
///
/// See [`parse_enum`].
pub fn parse_optional_enum<T: serde::de::DeserializeOwned>(
    s: Option<&str>,
) -> Result<Option<T>, DatabaseError> {
    s.map(parse_enum).transpose()
}

/// Read a nullable TEXT column.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, so nullable
/// columns must go through `Option<String>`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    Ok(row.get::<Option<String>>(idx)?)
}

/// Decode a perspective rank column.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` for a rank outside the scale.
pub fn parse_perspective(rank: i64) -> Result<Perspective, DatabaseError> {
    Perspective::from_rank(rank)
        .ok_or_else(|| DatabaseError::InvalidState(format!("perspective rank {rank} out of range")))
}

/// Decode a JSON array of strings stored as TEXT.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the column is not a JSON string array.
pub fn parse_string_list(s: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(s)
        .map_err(|e| DatabaseError::Query(format!("Invalid JSON list in column: {e}")))
}

/// Encode any serializable value as JSON TEXT.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn to_json_text<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Other(e.into()))
}

/// Narrow a stored non-negative integer.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` when the value does not fit.
pub fn narrow<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T, DatabaseError> {
    T::try_from(value)
        .map_err(|_| DatabaseError::InvalidState(format!("{column} value {value} out of range")))
}

#[must_use]
pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[must_use]
pub fn opt_text(s: Option<&str>) -> Value {
    s.map_or(Value::Null, text)
}

#[must_use]
pub fn opt_datetime(dt: Option<&DateTime<Utc>>) -> Value {
    dt.map_or(Value::Null, |dt| Value::Text(format_datetime(dt)))
}

/// `UNIQUE constraint failed` from `SQLite` on a duplicate primary key.
#[must_use]
pub fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

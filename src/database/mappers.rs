// ABOUTME: Column codecs shared by every store: timestamps, string lists, and counters
// ABOUTME: Timestamps are fixed-width RFC 3339 UTC text so lexical order equals chronological order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! Model ↔ SQL column conversion helpers
//!
//! All timestamp columns use the same encoding: RFC 3339, UTC, microsecond
//! precision, `Z` suffix (`2025-03-01T09:30:00.000000Z`). Because every value
//! has the same width, `ORDER BY created_at` and range comparisons on the text
//! column are chronological.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{UserPreferences, WeightUnit};

/// Encode a timestamp for storage
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Encode an optional timestamp for storage
#[must_use]
pub fn format_optional_timestamp(timestamp: Option<DateTime<Utc>>) -> Option<String> {
    timestamp.map(format_timestamp)
}

/// Decode a stored timestamp
///
/// # Errors
///
/// Returns `SerializationError` if the text is not RFC 3339
pub fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Decode an optional stored timestamp
///
/// # Errors
///
/// Returns `SerializationError` if a present value is not RFC 3339
pub fn parse_optional_timestamp(value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    value.map(parse_timestamp).transpose()
}

/// Encode a list of strings as JSON text
///
/// # Errors
///
/// Returns `SerializationError` if serialization fails
pub fn encode_string_list(values: &[String]) -> AppResult<String> {
    Ok(serde_json::to_string(values)?)
}

/// Decode a JSON text column into a list of strings
///
/// # Errors
///
/// Returns `SerializationError` if the column does not hold a JSON string array
pub fn decode_string_list(value: &str) -> AppResult<Vec<String>> {
    Ok(serde_json::from_str(value)?)
}

/// Narrow a stored integer to `u32`
///
/// # Errors
///
/// Returns `SerializationError` if the stored value is negative or too large
pub fn to_u32(value: i64, column: &str) -> AppResult<u32> {
    u32::try_from(value).map_err(|_| {
        AppError::new(
            ErrorCode::SerializationError,
            format!("Column '{column}' holds out-of-range value {value}"),
        )
    })
}

/// Narrow a stored count to `u64`, clamping impossible negatives to zero
#[must_use]
pub fn count_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Convert a `user_preferences` row
///
/// # Errors
///
/// Returns an error if a column is missing or malformed
pub fn row_to_user_preferences(row: &SqliteRow) -> AppResult<UserPreferences> {
    let weight_unit: String = row.try_get("weight_unit")?;
    let rest_seconds: i64 = row.try_get("default_rest_seconds")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(UserPreferences {
        user_id: row.try_get("user_id")?,
        weight_unit: WeightUnit::parse(&weight_unit),
        default_rest_seconds: to_u32(rest_seconds, "default_rest_seconds")?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_timestamp_encoding_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let encoded = format_timestamp(whole);
        assert_eq!(encoded, "2025-03-01T09:30:00.000000Z");
        assert_eq!(parse_timestamp(&encoded).unwrap(), whole);
    }

    #[test]
    fn test_lexical_order_is_chronological() {
        let earlier = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_timestamp(earlier) < format_timestamp(later));
    }

    #[test]
    fn test_string_list_codec() {
        let parts = vec!["chest".to_owned(), "triceps".to_owned()];
        let encoded = encode_string_list(&parts).unwrap();
        assert_eq!(encoded, r#"["chest","triceps"]"#);
        assert_eq!(decode_string_list(&encoded).unwrap(), parts);
        assert!(decode_string_list("not json").is_err());
    }

    #[test]
    fn test_negative_counter_rejected() {
        assert_eq!(to_u32(-1, "reps").unwrap_err().code, ErrorCode::SerializationError);
        assert_eq!(to_u32(12, "reps").unwrap(), 12);
    }
}

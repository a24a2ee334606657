//! Field accessors over normalized rows.
//!
//! Catalog queries return the same logical fields in different physical
//! shapes per backend: `YES`/`NO` strings, 0/1 integers, booleans, numeric
//! strings, JSON arrays or comma-joined lists. These helpers read a field
//! without caring which one arrived.

use crate::models::JsonRow;
use serde_json::Value as JsonValue;

/// Look up a field, falling back to a case-insensitive match.
pub fn get<'a>(row: &'a JsonRow, key: &str) -> Option<&'a JsonValue> {
    row.get(key).or_else(|| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Text form of a field. NULL and missing fields are `None`.
pub fn text(row: &JsonRow, key: &str) -> Option<String> {
    match get(row, key)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Truthiness of a field across the encodings backends use for flags.
pub fn flag(row: &JsonRow, key: &str) -> bool {
    get(row, key).is_some_and(is_truthy)
}

pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => matches!(
            s.trim().to_ascii_uppercase().as_str(),
            "YES" | "TRUE" | "ON" | "1" | "T"
        ),
        _ => false,
    }
}

/// Integer value of a numeric or numeric-string field.
pub fn int(row: &JsonRow, key: &str) -> Option<i64> {
    match get(row, key)? {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|v| v as i64)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|v| v as i64))
        }
        _ => None,
    }
}

/// Row-count estimate of a field: NULL, missing and negative values read as 0.
pub fn row_estimate(row: &JsonRow, key: &str) -> u64 {
    int(row, key).map(|n| n.max(0) as u64).unwrap_or(0)
}

/// A list field, given either as a JSON array or a comma-joined string.
pub fn list(row: &JsonRow, key: &str) -> Vec<String> {
    match get(row, key) {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect(),
        Some(JsonValue::String(s)) => {
            // Postgres may hand back the JSON array as text
            if let Ok(JsonValue::Array(items)) = serde_json::from_str::<JsonValue>(s) {
                return items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
            }
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        }
        _ => Vec::new(),
    }
}

/// First value of the first row, for single-value probes.
pub fn first_value(rows: &[JsonRow]) -> Option<&JsonValue> {
    rows.first().and_then(|row| row.values().next())
}

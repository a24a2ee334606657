//! Query-related data models.
//!
//! This module defines the parameter and row types of the `execute`
//! primitive and the bounded result returned by the query gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum rows returned by a read query; the rest are counted, not returned.
pub const MAX_QUERY_ROWS: usize = 1000;

/// A normalized result row: column name to value, in select-list order.
pub type JsonRow = serde_json::Map<String, JsonValue>;

/// A parameter value for parameterized statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl QueryParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for QueryParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Bounded result of a read query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    /// Column names in select-list order
    pub columns: Vec<String>,
    pub rows: Vec<JsonRow>,
    /// Number of rows returned in `rows`
    pub row_count: usize,
    /// Number of rows the statement actually produced
    pub total_rows: usize,
    pub truncated: bool,
    pub max_rows: usize,
}

impl QueryOutput {
    /// Bound `rows` to `max_rows`, remembering the true total.
    pub fn bounded(mut rows: Vec<JsonRow>, max_rows: usize) -> Self {
        let total_rows = rows.len();
        let truncated = total_rows > max_rows;
        rows.truncate(max_rows);

        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            columns,
            row_count: rows.len(),
            rows,
            total_rows,
            truncated,
            max_rows,
        }
    }

    /// Note describing the truncation, if any.
    pub fn truncation_note(&self) -> Option<String> {
        self.truncated.then(|| {
            format!(
                "Showing {} of {} rows (result capped at {} rows)",
                self.row_count, self.total_rows, self.max_rows
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<JsonRow> {
        (0..n)
            .map(|i| {
                let mut row = JsonRow::new();
                row.insert("n".to_string(), json!(i));
                row.insert("label".to_string(), json!(format!("row {i}")));
                row
            })
            .collect()
    }

    #[test]
    fn test_bounded_under_cap() {
        let out = QueryOutput::bounded(rows(3), MAX_QUERY_ROWS);
        assert_eq!(out.row_count, 3);
        assert_eq!(out.total_rows, 3);
        assert!(!out.truncated);
        assert!(out.truncation_note().is_none());
        assert_eq!(out.columns, vec!["n", "label"]);
    }

    #[test]
    fn test_bounded_over_cap_reports_total() {
        let out = QueryOutput::bounded(rows(1500), MAX_QUERY_ROWS);
        assert_eq!(out.row_count, 1000);
        assert_eq!(out.rows.len(), 1000);
        assert_eq!(out.total_rows, 1500);
        assert!(out.truncated);
        let note = out.truncation_note().unwrap();
        assert!(note.contains("1000 of 1500"));
    }

    #[test]
    fn test_bounded_exactly_at_cap_is_not_truncated() {
        let out = QueryOutput::bounded(rows(1000), MAX_QUERY_ROWS);
        assert!(!out.truncated);
    }

    #[test]
    fn test_query_param_untagged() {
        let params: Vec<QueryParam> = serde_json::from_str(r#"[null, true, 7, 1.5, "x"]"#).unwrap();
        assert_eq!(
            params.iter().map(QueryParam::type_name).collect::<Vec<_>>(),
            vec!["null", "bool", "int", "float", "string"]
        );
    }
}

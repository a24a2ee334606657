//! Text rendering for tool payloads.
//!
//! Query results render as an ASCII table in the style of the MySQL CLI;
//! explain results render as a short labelled report.

use crate::models::{ExplainResult, JsonRow, QueryOutput};
use serde_json::Value as JsonValue;
use std::fmt::Write as _;
use unicode_width::UnicodeWidthStr;

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}

/// ASCII table of `rows` over `columns`, padded by display width.
pub fn format_as_table(columns: &[String], rows: &[JsonRow]) -> String {
    if columns.is_empty() {
        return "Empty set\n".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for row in rows {
        for (i, col) in columns.iter().enumerate() {
            if let Some(value) = row.get(col) {
                widths[i] = widths[i].max(format_value(value).width());
            }
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    let mut output = separator.clone();
    for (col, w) in columns.iter().zip(&widths) {
        output.push_str(&format!("| {} ", pad(col, *w, Align::Center)));
    }
    output.push_str("|\n");
    output.push_str(&separator);

    for row in rows {
        for (col, w) in columns.iter().zip(&widths) {
            let value = row.get(col).unwrap_or(&JsonValue::Null);
            // Right-align numbers, left-align others
            let align = if value.is_number() {
                Align::Right
            } else {
                Align::Left
            };
            output.push_str(&format!("| {} ", pad(&format_value(value), *w, align)));
        }
        output.push_str("|\n");
    }
    output.push_str(&separator);
    output
}

enum Align {
    Left,
    Right,
    Center,
}

/// `format!` width specifiers count chars, not display columns.
fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = width.saturating_sub(text.width());
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(fill)),
        Align::Right => format!("{}{}", " ".repeat(fill), text),
        Align::Center => {
            let left = fill / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(fill - left))
        }
    }
}

/// Table, row count and truncation note for a query result.
pub fn format_query_output(output: &QueryOutput) -> String {
    if output.rows.is_empty() {
        return "Empty set (0 rows)\n".to_string();
    }

    let mut text = format_as_table(&output.columns, &output.rows);
    let row_text = if output.row_count == 1 { "row" } else { "rows" };
    let _ = writeln!(text, "{} {} in set", output.row_count, row_text);
    if let Some(note) = output.truncation_note() {
        let _ = writeln!(text, "{}", note);
    }
    text
}

/// Explain report: estimate, indexes used, scans, then warnings.
pub fn format_explain_result(result: &ExplainResult) -> String {
    let mut text = format!("Summary: {}\n", result.summary);

    if let Some(rows) = result.estimated_rows {
        let _ = writeln!(text, "Estimated rows: {}", rows);
    }
    if !result.indexes_used.is_empty() {
        let _ = writeln!(text, "Indexes used: {}", result.indexes_used.join(", "));
    }
    if !result.sequential_scans.is_empty() {
        let _ = writeln!(
            text,
            "Sequential scans: {}",
            result.sequential_scans.join(", ")
        );
    }
    if !result.warnings.is_empty() {
        text.push_str("Warnings:\n");
        for warning in &result.warnings {
            let _ = writeln!(text, "  - {}", warning);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, JsonValue)]) -> JsonRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&JsonValue::Null), "NULL");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!("x")), "x");
        assert_eq!(format_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_table_alignment() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            row(&[("id", json!(7)), ("name", json!("ann"))]),
            row(&[("id", json!(12)), ("name", JsonValue::Null)]),
        ];
        let table = format_as_table(&columns, &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "+----+------+");
        assert_eq!(lines[1], "| id | name |");
        assert_eq!(lines[3], "|  7 | ann  |");
        assert_eq!(lines[4], "| 12 | NULL |");
    }

    #[test]
    fn test_table_uses_display_width() {
        let columns = vec!["name".to_string()];
        let rows = vec![row(&[("name", json!("日本"))])];
        let table = format_as_table(&columns, &rows);
        assert!(table.contains("| 日本 |"));
        assert!(table.starts_with("+------+"));
    }

    #[test]
    fn test_query_output_reports_truncation() {
        let rows: Vec<JsonRow> = (0..5).map(|i| row(&[("n", json!(i))])).collect();
        let output = QueryOutput::bounded(rows, 3);
        let text = format_query_output(&output);
        assert!(text.contains("3 rows in set"));
        assert!(text.contains("Showing 3 of 5 rows (result capped at 3 rows)"));
    }

    #[test]
    fn test_explain_report_order() {
        let mut result = ExplainResult::new();
        result.estimated_rows = Some(40);
        result.record_index("idx_a");
        result.record_sequential_scan("orders", Some(40));
        result.finalize();

        let text = format_explain_result(&result);
        let estimate = text.find("Estimated rows: 40").unwrap();
        let indexes = text.find("Indexes used: idx_a").unwrap();
        let scans = text.find("Sequential scans: orders").unwrap();
        let warnings = text.find("Warnings:").unwrap();
        assert!(estimate < indexes && indexes < scans && scans < warnings);
    }

    #[test]
    fn test_explain_report_without_details() {
        let mut result = ExplainResult::new();
        result.finalize();
        assert_eq!(
            format_explain_result(&result),
            "Summary: No plan details available\n"
        );
    }
}

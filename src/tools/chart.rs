//! Chart tool.
//!
//! Turns a read query into a [`ChartConfig`]: the first result column is the
//! x-axis and the remaining (or explicitly chosen) columns are series.

use crate::error::{DbError, DbResult};
use crate::models::{ChartConfig, ChartType, QueryOutput};
use crate::tools::query::{QueryInput, QueryToolHandler};
use serde::Deserialize;
use tracing::info;

/// Input for the chart tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chart_type: ChartType,
    /// Read query whose first column is the x-axis
    pub sql: String,
    /// Series columns; every column after the first when absent
    #[serde(default)]
    pub series: Option<Vec<String>>,
    #[serde(default)]
    pub stacked: Option<bool>,
}

pub struct ChartToolHandler {
    query: QueryToolHandler,
}

impl ChartToolHandler {
    pub fn new(query: QueryToolHandler) -> Self {
        Self { query }
    }

    pub async fn build_chart(&self, input: ChartInput) -> DbResult<ChartConfig> {
        let output = self.query.run_query(QueryInput::new(input.sql.clone())).await?;
        let config = chart_from_output(input, output)?;

        info!(
            chart_type = ?config.chart_type,
            points = config.data.len(),
            series = config.multi_series.as_ref().map_or(1, Vec::len),
            "Built chart configuration"
        );
        Ok(config)
    }
}

/// Map query output onto a chart configuration.
pub fn chart_from_output(input: ChartInput, output: QueryOutput) -> DbResult<ChartConfig> {
    if output.rows.is_empty() {
        return Err(DbError::validation("Chart query returned no rows"));
    }
    let Some((x_axis_key, value_columns)) = output.columns.split_first() else {
        return Err(DbError::validation("Chart query returned no columns"));
    };
    if value_columns.is_empty() {
        return Err(DbError::validation(
            "Chart query must return an x-axis column followed by at least one series column",
        ));
    }

    let series: Vec<String> = match input.series.filter(|s| !s.is_empty()) {
        Some(requested) => {
            if let Some(unknown) = requested.iter().find(|s| !value_columns.contains(*s)) {
                return Err(DbError::validation(format!(
                    "Unknown series column '{}'. Available: {}",
                    unknown,
                    value_columns.join(", ")
                )));
            }
            requested
        }
        None => value_columns.to_vec(),
    };

    Ok(ChartConfig {
        title: input.title,
        description: input.description,
        chart_type: input.chart_type,
        data: output.rows,
        data_key: series[0].clone(),
        x_axis_key: x_axis_key.clone(),
        multi_series: (series.len() > 1).then_some(series),
        stacked: input.stacked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JsonRow;
    use serde_json::json;

    fn input(series: Option<Vec<&str>>) -> ChartInput {
        ChartInput {
            title: "Revenue".to_string(),
            description: Some("Monthly".to_string()),
            chart_type: ChartType::Line,
            sql: "SELECT month, online, retail FROM revenue".to_string(),
            series: series.map(|s| s.into_iter().map(String::from).collect()),
            stacked: Some(true),
        }
    }

    fn output(columns: &[&str], rows: usize) -> QueryOutput {
        let rows = (0..rows)
            .map(|i| {
                columns
                    .iter()
                    .map(|c| (c.to_string(), json!(i)))
                    .collect::<JsonRow>()
            })
            .collect();
        QueryOutput::bounded(rows, 1000)
    }

    #[test]
    fn test_first_column_is_x_axis() {
        let config = chart_from_output(input(None), output(&["month", "online", "retail"], 3))
            .unwrap();
        assert_eq!(config.x_axis_key, "month");
        assert_eq!(config.data_key, "online");
        assert_eq!(
            config.multi_series,
            Some(vec!["online".to_string(), "retail".to_string()])
        );
        assert_eq!(config.data.len(), 3);
        assert_eq!(config.stacked, Some(true));
        assert_eq!(config.chart_type, ChartType::Line);
    }

    #[test]
    fn test_explicit_single_series() {
        let config = chart_from_output(
            input(Some(vec!["retail"])),
            output(&["month", "online", "retail"], 2),
        )
        .unwrap();
        assert_eq!(config.data_key, "retail");
        assert!(config.multi_series.is_none());
    }

    #[test]
    fn test_unknown_series_rejected() {
        let err = chart_from_output(input(Some(vec!["wholesale"])), output(&["month", "online"], 2))
            .unwrap_err();
        assert!(err.to_string().contains("wholesale"));

        // The x-axis column cannot double as a series
        assert!(chart_from_output(input(Some(vec!["month"])), output(&["month", "online"], 2))
            .is_err());
    }

    #[test]
    fn test_needs_rows_and_two_columns() {
        assert!(matches!(
            chart_from_output(input(None), output(&["month", "online"], 0)),
            Err(DbError::Validation { .. })
        ));
        assert!(matches!(
            chart_from_output(input(None), output(&["month"], 4)),
            Err(DbError::Validation { .. })
        ));
    }

    #[test]
    fn test_chart_input_defaults() {
        let input: ChartInput =
            serde_json::from_str(r#"{"title": "t", "sql": "SELECT a, b FROM x"}"#).unwrap();
        assert_eq!(input.chart_type, ChartType::Bar);
        assert!(input.series.is_none());
        assert!(input.stacked.is_none());
    }
}

//! Chart configuration handed to a rendering front end.

use crate::models::JsonRow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Area,
    #[default]
    Bar,
    Line,
    Pie,
}

impl std::str::FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "area" => Ok(Self::Area),
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            other => Err(format!(
                "unknown chart type '{}': expected area, bar, line or pie",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub chart_type: ChartType,
    pub data: Vec<JsonRow>,
    /// First (or only) series column
    pub data_key: String,
    pub x_axis_key: String,
    /// Present when more than one series is charted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_series: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_type_parse() {
        assert_eq!("Line".parse::<ChartType>().unwrap(), ChartType::Line);
        assert!("scatter".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_chart_config_serialization() {
        let config = ChartConfig {
            title: "Signups".to_string(),
            description: None,
            chart_type: ChartType::Area,
            data: Vec::new(),
            data_key: "count".to_string(),
            x_axis_key: "day".to_string(),
            multi_series: None,
            stacked: Some(true),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["chartType"], "area");
        assert_eq!(json["xAxisKey"], "day");
        assert_eq!(json["dataKey"], "count");
        assert_eq!(json["stacked"], true);
        assert!(json.get("multiSeries").is_none());
        assert!(json.get("description").is_none());
    }
}

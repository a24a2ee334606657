//! Data models for db-lens.
//!
//! This module re-exports all model types used throughout the crate.

pub mod chart;
pub mod connection;
pub mod explain;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use chart::{ChartConfig, ChartType};
pub use connection::{
    ConnectionTarget, DatabaseType, REDACTED_PASSWORD, SQLITE_EXTENSIONS,
    redact_connection_string,
};
pub use explain::{ExplainResult, NO_INDEXES_WARNING, NO_PLAN_DETAILS};
pub use query::{JsonRow, MAX_QUERY_ROWS, QueryOutput, QueryParam};
pub use schema::{ColumnInfo, ForeignKey, IndexInfo, TableDescription, TableSummary};

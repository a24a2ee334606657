//! Tool handlers.
//!
//! One handler per exposed operation, each holding the shared
//! [`ConnectionManager`](crate::db::ConnectionManager):
//! - `connection`: connect and disconnect
//! - `schema`: list_tables, describe_table, get_full_schema
//! - `explain`: explain_query
//! - `query`: run_query, the read-only query gateway
//! - `chart`: build_chart
//! - `sql_validator`: read-only statement validation
//! - `format`: text rendering of results

pub mod chart;
pub mod connection;
pub mod explain;
pub mod format;
pub mod query;
pub mod schema;
pub mod sql_validator;

pub use chart::{ChartInput, ChartToolHandler};
pub use connection::{ConnectInput, ConnectionToolHandler};
pub use explain::{ExplainInput, ExplainToolHandler};
pub use query::{QueryInput, QueryToolHandler};
pub use schema::{DescribeTableInput, SchemaToolHandler};

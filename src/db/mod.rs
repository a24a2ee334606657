//! Database access layer.
//!
//! - `pool`: connection manager and read-only sessions
//! - `dialect`: per-backend catalog, read-only and plan strategies
//! - `executor`: statement execution into normalized JSON rows
//! - `schema`: introspection on top of the dialect strategies
//! - `explain`: execution plan normalization
//! - `types` and `row`: value decoding and catalog row access

pub mod dialect;
pub mod executor;
pub mod explain;
#[macro_use]
pub mod macros;
pub mod pool;
pub mod row;
pub mod schema;
pub mod types;

pub use dialect::Dialect;
pub use executor::fetch_json_rows;
pub use explain::PlanNormalizer;
pub use pool::{ConnectionManager, DbPool, Session};
pub use schema::{SchemaInspector, FULL_SCHEMA_TABLE_LIMIT, NO_TABLES_MESSAGE};

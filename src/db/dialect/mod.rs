//! Per-backend strategies.
//!
//! Each backend implements [`Dialect`] once: its read-only session setup,
//! its catalog queries mapped into the shared schema model, and its execution
//! plan statement and reduction. Callers pick the strategy from a session's
//! [`DatabaseType`] with [`crate::with_dialect!`]; nothing outside this module
//! branches on the backend.

mod mysql;
mod postgres;
mod sqlite;

use crate::db::pool::Session;
use crate::error::DbResult;
use crate::models::{DatabaseType, ExplainResult, JsonRow, TableDescription, TableSummary};

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

/// Backend capability set.
#[allow(async_fn_in_trait)]
pub trait Dialect {
    fn db_type(&self) -> DatabaseType;

    /// Statement run on every new pooled connection to make it read-only.
    fn read_only_statement(&self) -> &'static str;

    /// Query whose single value is truthy when the session is read-only.
    fn read_only_probe(&self) -> &'static str;

    /// Query whose single value is the server version.
    fn version_query(&self) -> &'static str;

    /// Base tables ordered by name, with row-count estimates.
    async fn list_tables(&self, session: &Session) -> DbResult<Vec<TableSummary>>;

    /// Columns, foreign keys and indexes of `table`.
    ///
    /// Fails with `TableNotFound` when the catalog reports no columns.
    async fn describe_table(&self, session: &Session, table: &str) -> DbResult<TableDescription>;

    /// Wrap `sql` in the backend's plan statement.
    fn explain_statement(&self, sql: &str) -> String;

    /// Reduce the rows returned by [`Dialect::explain_statement`] for `sql`
    /// into `result`.
    ///
    /// `sql` lets backends whose plans name relations by alias map them
    /// back to tables. On a malformed plan, whatever was collected before the failure stays
    /// in `result` and a `PlanParse` error is returned.
    fn normalize_plan(
        &self,
        sql: &str,
        rows: &[JsonRow],
        result: &mut ExplainResult,
    ) -> DbResult<()>;
}

/// Parse a plan document that may arrive as JSON or as JSON text.
fn plan_document(value: &serde_json::Value) -> DbResult<serde_json::Value> {
    match value {
        serde_json::Value::String(text) => serde_json::from_str(text)
            .map_err(|e| crate::error::DbError::plan_parse(format!("invalid plan JSON: {}", e))),
        other => Ok(other.clone()),
    }
}

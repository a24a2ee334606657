//! MySQL/MariaDB strategy: `information_schema` for the current database,
//! `EXPLAIN FORMAT=JSON` plans.

use super::{Dialect, plan_document};
use crate::db::pool::Session;
use crate::db::row;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnInfo, DatabaseType, ExplainResult, ForeignKey, IndexInfo, JsonRow, QueryParam,
    TableDescription, TableSummary,
};
use serde_json::Value as JsonValue;
use tracing::debug;

// information_schema text columns are converted explicitly; some servers
// report them with a binary collation.
mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT
            CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
            TABLE_ROWS
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
    "#;

    pub const COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
            CONVERT(COLUMN_TYPE USING utf8mb4) AS COLUMN_TYPE,
            CONVERT(IS_NULLABLE USING utf8mb4) AS IS_NULLABLE,
            CONVERT(COLUMN_DEFAULT USING utf8mb4) AS COLUMN_DEFAULT,
            CONVERT(COLUMN_KEY USING utf8mb4) AS COLUMN_KEY
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    "#;

    pub const FOREIGN_KEYS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
            CONVERT(REFERENCED_TABLE_NAME USING utf8mb4) AS REFERENCED_TABLE_NAME,
            CONVERT(REFERENCED_COLUMN_NAME USING utf8mb4) AS REFERENCED_COLUMN_NAME
        FROM information_schema.KEY_COLUMN_USAGE
        WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_NAME = ?
            AND REFERENCED_TABLE_NAME IS NOT NULL
        ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
    "#;

    pub const INDEXES: &str = r#"
        SELECT
            CONVERT(INDEX_NAME USING utf8mb4) AS INDEX_NAME,
            CONVERT(GROUP_CONCAT(COLUMN_NAME ORDER BY SEQ_IN_INDEX) USING utf8mb4) AS COLUMN_NAMES,
            MIN(NON_UNIQUE) AS NON_UNIQUE,
            CONVERT(MIN(INDEX_TYPE) USING utf8mb4) AS INDEX_TYPE,
            MAX(CARDINALITY) AS CARDINALITY
        FROM information_schema.STATISTICS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
        GROUP BY INDEX_NAME
        ORDER BY INDEX_NAME
    "#;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn read_only_statement(&self) -> &'static str {
        "SET SESSION TRANSACTION READ ONLY"
    }

    fn read_only_probe(&self) -> &'static str {
        "SELECT @@SESSION.transaction_read_only AS transaction_read_only"
    }

    fn version_query(&self) -> &'static str {
        "SELECT VERSION() AS version"
    }

    async fn list_tables(&self, session: &Session) -> DbResult<Vec<TableSummary>> {
        let rows = session.execute(queries::LIST_TABLES, &[]).await?;
        let tables = map_tables(&rows);
        debug!(count = tables.len(), "Listed MySQL tables");
        Ok(tables)
    }

    async fn describe_table(&self, session: &Session, table: &str) -> DbResult<TableDescription> {
        let params = [QueryParam::from(table)];

        let columns = map_columns(&session.execute(queries::COLUMNS, &params).await?);
        if columns.is_empty() {
            return Err(DbError::table_not_found(table));
        }

        let mut description = TableDescription::new(table);
        description.columns = columns;
        description.foreign_keys =
            map_foreign_keys(&session.execute(queries::FOREIGN_KEYS, &params).await?);
        description.indexes = map_indexes(&session.execute(queries::INDEXES, &params).await?);

        debug!(
            table,
            columns = description.columns.len(),
            indexes = description.indexes.len(),
            "Described MySQL table"
        );
        Ok(description)
    }

    fn explain_statement(&self, sql: &str) -> String {
        format!("EXPLAIN FORMAT=JSON {}", sql)
    }

    fn normalize_plan(
        &self,
        _sql: &str,
        rows: &[JsonRow],
        result: &mut ExplainResult,
    ) -> DbResult<()> {
        let raw = rows
            .first()
            .and_then(|r| row::get(r, "EXPLAIN").or_else(|| r.values().next()))
            .ok_or_else(|| DbError::plan_parse("EXPLAIN returned no rows"))?;

        let document = plan_document(raw)?;
        if !document.is_object() {
            return Err(DbError::plan_parse("plan document is not a JSON object"));
        }

        let mut last_estimate = None;
        walk(&document, result, &mut last_estimate);
        result.estimated_rows = last_estimate;
        Ok(())
    }
}

/// Visit every object and array; the nesting varies by query form
/// (`nested_loop`, `ordering_operation`, `grouping_operation`, subqueries, ...).
fn walk(value: &JsonValue, result: &mut ExplainResult, last_estimate: &mut Option<u64>) {
    match value {
        JsonValue::Object(map) => {
            let access_type = map.get("access_type").and_then(JsonValue::as_str);
            let table_name = map.get("table_name").and_then(JsonValue::as_str);

            if let (Some(access_type), Some(table_name)) = (access_type, table_name) {
                if access_type == "ALL" {
                    let examined = map.get("rows_examined_per_scan").and_then(count);
                    result.record_sequential_scan(table_name, examined);
                }
                if let Some(key) = map.get("key").and_then(JsonValue::as_str) {
                    result.record_index(key);
                }
                if let Some(produced) = map.get("rows_produced_per_join").and_then(count) {
                    *last_estimate = Some(produced);
                }
            }

            for child in map.values() {
                walk(child, result, last_estimate);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                walk(item, result, last_estimate);
            }
        }
        _ => {}
    }
}

/// Row counts appear as numbers, or as strings on some server versions.
fn count(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0) as u64),
        _ => None,
    }
}

fn map_tables(rows: &[JsonRow]) -> Vec<TableSummary> {
    rows.iter()
        .filter_map(|r| {
            let name = row::text(r, "TABLE_NAME")?;
            Some(TableSummary::new(name, row::row_estimate(r, "TABLE_ROWS")))
        })
        .collect()
}

fn map_columns(rows: &[JsonRow]) -> Vec<ColumnInfo> {
    rows.iter()
        .filter_map(|r| {
            let name = row::text(r, "COLUMN_NAME")?;
            let data_type = row::text(r, "COLUMN_TYPE").unwrap_or_default();
            let is_primary_key = row::text(r, "COLUMN_KEY").is_some_and(|k| k == "PRI");
            Some(
                ColumnInfo::new(name, data_type, row::flag(r, "IS_NULLABLE"))
                    .with_default(row::text(r, "COLUMN_DEFAULT"))
                    .with_primary_key(is_primary_key),
            )
        })
        .collect()
}

fn map_foreign_keys(rows: &[JsonRow]) -> Vec<ForeignKey> {
    rows.iter()
        .filter_map(|r| {
            Some(ForeignKey::new(
                row::text(r, "COLUMN_NAME")?,
                row::text(r, "REFERENCED_TABLE_NAME")?,
                row::text(r, "REFERENCED_COLUMN_NAME")?,
            ))
        })
        .collect()
}

fn map_indexes(rows: &[JsonRow]) -> Vec<IndexInfo> {
    rows.iter()
        .filter_map(|r| {
            let name = row::text(r, "INDEX_NAME")?;
            let is_primary = name == "PRIMARY";
            let cardinality = row::int(r, "CARDINALITY").map(|c| c.max(0) as u64);
            Some(
                IndexInfo::new(name, row::list(r, "COLUMN_NAMES"))
                    .with_unique(!row::flag(r, "NON_UNIQUE"))
                    .with_primary(is_primary)
                    .with_type(row::text(r, "INDEX_TYPE"))
                    .with_cardinality(cardinality),
            )
        })
        .collect()
}

//! Schema introspection.
//!
//! The inspector delegates catalog access to the session's dialect strategy
//! and renders the shared text sections used by `describe_table` and the
//! full-schema dump.

use crate::db::dialect::Dialect;
use crate::db::pool::Session;
use crate::error::DbResult;
use crate::models::{TableDescription, TableSummary};
use crate::with_dialect;
use std::fmt::Write as _;
use tracing::debug;

/// Tables beyond this many are left out of the full-schema dump.
pub const FULL_SCHEMA_TABLE_LIMIT: usize = 100;

/// Message returned instead of an empty table list.
pub const NO_TABLES_MESSAGE: &str = "No tables found in the database.";

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// List base tables ordered by name.
    pub async fn list_tables(session: &Session) -> DbResult<Vec<TableSummary>> {
        with_dialect!(session.db_type(), |d| d.list_tables(session).await)
    }

    /// Describe a table's columns, foreign keys and indexes.
    pub async fn describe_table(session: &Session, table: &str) -> DbResult<TableDescription> {
        with_dialect!(session.db_type(), |d| d.describe_table(session, table).await)
    }

    /// Text dump of the first [`FULL_SCHEMA_TABLE_LIMIT`] tables.
    ///
    /// The header counts the tables actually included.
    pub async fn full_schema(session: &Session) -> DbResult<String> {
        let tables = Self::list_tables(session).await?;
        if tables.is_empty() {
            return Ok(NO_TABLES_MESSAGE.to_string());
        }

        let included = &tables[..tables.len().min(FULL_SCHEMA_TABLE_LIMIT)];
        if included.len() < tables.len() {
            debug!(
                total = tables.len(),
                included = included.len(),
                "Full schema capped"
            );
        }

        let mut sections = Vec::with_capacity(included.len());
        for table in included {
            let description = Self::describe_table(session, &table.name).await?;
            sections.push(render_table_section(
                &description,
                Some(table.estimated_row_count),
            ));
        }

        Ok(format!(
            "Database schema ({} tables):\n\n{}",
            included.len(),
            sections.join("\n")
        ))
    }
}

/// One line per table with its row estimate.
pub fn render_table_list(tables: &[TableSummary]) -> String {
    if tables.is_empty() {
        return NO_TABLES_MESSAGE.to_string();
    }

    let mut out = format!("Tables ({}):\n", tables.len());
    for table in tables {
        let _ = writeln!(
            out,
            "  - {} (~{} rows)",
            table.name, table.estimated_row_count
        );
    }
    out
}

/// Text section for one table: columns, foreign keys, indexes and,
/// when known, the row estimate.
pub fn render_table_section(description: &TableDescription, estimated_rows: Option<u64>) -> String {
    let mut out = format!("## {}\n", description.name);

    out.push_str("Columns:\n");
    for column in &description.columns {
        let _ = write!(out, "  - {} {}", column.name, column.data_type);
        if column.is_primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if !column.nullable {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default_value {
            let _ = write!(out, " DEFAULT {}", default);
        }
        out.push('\n');
    }

    if !description.foreign_keys.is_empty() {
        out.push_str("Foreign keys:\n");
        for fk in &description.foreign_keys {
            let _ = writeln!(
                out,
                "  - {} -> {}.{}",
                fk.column, fk.referenced_table, fk.referenced_column
            );
        }
    }

    if !description.indexes.is_empty() {
        out.push_str("Indexes:\n");
        for index in &description.indexes {
            let _ = write!(out, "  - {} ({})", index.name, index.columns.join(", "));
            if index.is_primary {
                out.push_str(" PRIMARY");
            } else if index.unique {
                out.push_str(" UNIQUE");
            }
            if let Some(index_type) = &index.index_type {
                let _ = write!(out, " [{}]", index_type);
            }
            if let Some(cardinality) = index.cardinality {
                let _ = write!(out, " cardinality={}", cardinality);
            }
            if let Some(predicate) = &index.partial_predicate {
                let _ = write!(out, " WHERE {}", predicate);
            }
            out.push('\n');
        }
    }

    if let Some(rows) = estimated_rows {
        let _ = writeln!(out, "Estimated rows: {}", rows);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnInfo, ForeignKey, IndexInfo};

    fn orders() -> TableDescription {
        let mut desc = TableDescription::new("orders");
        desc.columns = vec![
            ColumnInfo::new("id", "integer", false).with_primary_key(true),
            ColumnInfo::new("user_id", "integer", false),
            ColumnInfo::new("status", "text", true).with_default(Some("'open'".to_string())),
        ];
        desc.foreign_keys = vec![ForeignKey::new("user_id", "users", "id")];
        desc.indexes = vec![
            IndexInfo::new("orders_pkey", vec!["id".to_string()])
                .with_unique(true)
                .with_primary(true),
            IndexInfo::new("orders_open", vec!["user_id".to_string()])
                .with_type(Some("btree".to_string()))
                .with_partial_predicate(Some("status = 'open'".to_string())),
        ];
        desc
    }

    #[test]
    fn test_render_section() {
        let text = render_table_section(&orders(), Some(12));
        assert!(text.starts_with("## orders\n"));
        assert!(text.contains("  - id integer PRIMARY KEY NOT NULL"));
        assert!(text.contains("  - status text DEFAULT 'open'"));
        assert!(text.contains("  - user_id -> users.id"));
        assert!(text.contains("  - orders_pkey (id) PRIMARY"));
        assert!(text.contains("orders_open (user_id) [btree] WHERE status = 'open'"));
        assert!(text.trim_end().ends_with("Estimated rows: 12"));
    }

    #[test]
    fn test_render_section_without_estimate() {
        let text = render_table_section(&orders(), None);
        assert!(!text.contains("Estimated rows"));
    }

    #[test]
    fn test_render_table_list() {
        assert_eq!(render_table_list(&[]), NO_TABLES_MESSAGE);
        let text = render_table_list(&[TableSummary::new("users", 3)]);
        assert!(text.contains("users (~3 rows)"));
    }
}

//! Schema introspection tools.
//!
//! This module implements the `list_tables`, `describe_table` and
//! `get_full_schema` tools on top of [`SchemaInspector`].

use crate::db::schema::{render_table_list, render_table_section};
use crate::db::{ConnectionManager, SchemaInspector};
use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize)]
pub struct DescribeTableInput {
    pub table: String,
}

/// Handler for schema tools.
pub struct SchemaToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl SchemaToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Table names with row estimates, or an explicit message when the
    /// database has no tables.
    pub async fn list_tables(&self) -> DbResult<String> {
        let session = self.connection_manager.session().await?;
        let tables = SchemaInspector::list_tables(&session).await?;

        info!(count = tables.len(), "Listed tables");
        Ok(render_table_list(&tables))
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<String> {
        let table = input.table.trim();
        if table.is_empty() {
            return Err(DbError::validation("Table name cannot be empty"));
        }

        let session = self.connection_manager.session().await?;
        let description = SchemaInspector::describe_table(&session, table).await?;

        info!(
            table = %description.name,
            columns = description.columns.len(),
            indexes = description.indexes.len(),
            "Described table"
        );
        Ok(render_table_section(&description, None))
    }

    pub async fn get_full_schema(&self) -> DbResult<String> {
        let session = self.connection_manager.session().await?;
        SchemaInspector::full_schema(&session).await
    }
}

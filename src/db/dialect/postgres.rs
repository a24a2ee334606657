//! PostgreSQL strategy: `information_schema` plus `pg_catalog`, JSON plans.

use super::{Dialect, plan_document};
use crate::db::pool::Session;
use crate::db::row;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnInfo, DatabaseType, ExplainResult, ForeignKey, IndexInfo, JsonRow, QueryParam,
    TableDescription, TableSummary,
};
use serde::Deserialize;
use tracing::debug;

/// Introspection is limited to the default schema.
const SCHEMA: &str = "public";

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT
            t.table_name::text AS table_name,
            COALESCE(c.reltuples, 0)::bigint AS estimated_rows
        FROM information_schema.tables t
        LEFT JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
        LEFT JOIN pg_catalog.pg_class c
            ON c.relname = t.table_name AND c.relnamespace = n.oid
        WHERE t.table_schema = $1 AND t.table_type = 'BASE TABLE'
        ORDER BY t.table_name
    "#;

    pub const COLUMNS: &str = r#"
        SELECT
            c.column_name::text AS column_name,
            CASE
                WHEN c.character_maximum_length IS NOT NULL
                    THEN c.data_type || '(' || c.character_maximum_length || ')'
                WHEN c.data_type IN ('USER-DEFINED', 'ARRAY') THEN c.udt_name::text
                ELSE c.data_type::text
            END AS data_type,
            c.is_nullable::text AS is_nullable,
            c.column_default::text AS column_default,
            EXISTS (
                SELECT 1
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                    AND tc.table_name = kcu.table_name
                WHERE tc.constraint_type = 'PRIMARY KEY'
                    AND tc.table_schema = c.table_schema
                    AND tc.table_name = c.table_name
                    AND kcu.column_name = c.column_name
            ) AS is_primary_key
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
    "#;

    /// One row per column pair; `conkey` and `confkey` are parallel arrays.
    pub const FOREIGN_KEYS: &str = r#"
        SELECT
            a.attname::text AS column_name,
            rc.relname::text AS referenced_table,
            ra.attname::text AS referenced_column
        FROM pg_catalog.pg_constraint con
        JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(attnum, refattnum, ord)
        JOIN pg_catalog.pg_attribute a
            ON a.attrelid = con.conrelid AND a.attnum = k.attnum
        JOIN pg_catalog.pg_attribute ra
            ON ra.attrelid = con.confrelid AND ra.attnum = k.refattnum
        WHERE con.contype = 'f' AND n.nspname = $1 AND c.relname = $2
        ORDER BY con.conname, k.ord
    "#;

    pub const INDEXES: &str = r#"
        SELECT
            i.relname::text AS index_name,
            array_to_json(ARRAY(
                SELECT a.attname::text
                FROM unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
                JOIN pg_catalog.pg_attribute a
                    ON a.attrelid = t.oid AND a.attnum = k.attnum
                ORDER BY k.ord
            )) AS columns,
            ix.indisunique AS is_unique,
            ix.indisprimary AS is_primary,
            am.amname::text AS index_type,
            pg_catalog.pg_get_expr(ix.indpred, ix.indrelid) AS predicate
        FROM pg_catalog.pg_class t
        JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
        JOIN pg_catalog.pg_index ix ON ix.indrelid = t.oid
        JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
        JOIN pg_catalog.pg_am am ON am.oid = i.relam
        WHERE n.nspname = $1 AND t.relname = $2
        ORDER BY i.relname
    "#;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn read_only_statement(&self) -> &'static str {
        "SET SESSION CHARACTERISTICS AS TRANSACTION READ ONLY"
    }

    fn read_only_probe(&self) -> &'static str {
        "SELECT current_setting('transaction_read_only') AS transaction_read_only"
    }

    fn version_query(&self) -> &'static str {
        "SELECT version() AS version"
    }

    async fn list_tables(&self, session: &Session) -> DbResult<Vec<TableSummary>> {
        let rows = session
            .execute(queries::LIST_TABLES, &[QueryParam::from(SCHEMA)])
            .await?;
        let tables = map_tables(&rows);
        debug!(count = tables.len(), schema = SCHEMA, "Listed PostgreSQL tables");
        Ok(tables)
    }

    async fn describe_table(&self, session: &Session, table: &str) -> DbResult<TableDescription> {
        let params = [QueryParam::from(SCHEMA), QueryParam::from(table)];

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
            "Described PostgreSQL table"
        );
        Ok(description)
    }

    fn explain_statement(&self, sql: &str) -> String {
        format!("EXPLAIN (FORMAT JSON) {}", sql)
    }

    fn normalize_plan(
        &self,
        _sql: &str,
        rows: &[JsonRow],
        result: &mut ExplainResult,
    ) -> DbResult<()> {
        let raw = rows
            .first()
            .and_then(|r| row::get(r, "QUERY PLAN"))
            .ok_or_else(|| DbError::plan_parse("EXPLAIN returned no QUERY PLAN column"))?;

        let entries: Vec<PgExplainEntry> = serde_json::from_value(plan_document(raw)?)
            .map_err(|e| DbError::plan_parse(format!("unexpected plan shape: {}", e)))?;

        for entry in &entries {
            visit(&entry.plan, result);
        }
        // The root node's estimate is the row count the statement produces
        result.estimated_rows = entries
            .first()
            .and_then(|e| e.plan.plan_rows)
            .map(|rows| rows.max(0.0).round() as u64);

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PgExplainEntry {
    #[serde(rename = "Plan")]
    plan: PgPlanNode,
}

#[derive(Debug, Deserialize)]
struct PgPlanNode {
    #[serde(rename = "Node Type")]
    node_type: String,
    #[serde(rename = "Relation Name", default)]
    relation_name: Option<String>,
    #[serde(rename = "Plan Rows", default)]
    plan_rows: Option<f64>,
    #[serde(rename = "Index Name", default)]
    index_name: Option<String>,
    #[serde(rename = "Plans", default)]
    plans: Vec<PgPlanNode>,
}

fn visit(node: &PgPlanNode, result: &mut ExplainResult) {
    if node.node_type == "Seq Scan" {
        let table = node.relation_name.as_deref().unwrap_or("unknown");
        result.record_sequential_scan(table, node.plan_rows.map(|r| r.max(0.0).round() as u64));
    }
    if let Some(index) = &node.index_name {
        result.record_index(index.as_str());
    }
    for child in &node.plans {
        visit(child, result);
    }
}

fn map_tables(rows: &[JsonRow]) -> Vec<TableSummary> {
    rows.iter()
        .filter_map(|r| {
            let name = row::text(r, "table_name")?;
            Some(TableSummary::new(name, row::row_estimate(r, "estimated_rows")))
        })
        .collect()
}

fn map_columns(rows: &[JsonRow]) -> Vec<ColumnInfo> {
    rows.iter()
        .filter_map(|r| {
            let name = row::text(r, "column_name")?;
            let data_type = row::text(r, "data_type").unwrap_or_default();
            Some(
                ColumnInfo::new(name, data_type, row::flag(r, "is_nullable"))
                    .with_default(row::text(r, "column_default"))
                    .with_primary_key(row::flag(r, "is_primary_key")),
            )
        })
        .collect()
}

fn map_foreign_keys(rows: &[JsonRow]) -> Vec<ForeignKey> {
    rows.iter()
        .filter_map(|r| {
            Some(ForeignKey::new(
                row::text(r, "column_name")?,
                row::text(r, "referenced_table")?,
                row::text(r, "referenced_column")?,
            ))
        })
        .collect()
}

fn map_indexes(rows: &[JsonRow]) -> Vec<IndexInfo> {
    rows.iter()
        .filter_map(|r| {
            let name = row::text(r, "index_name")?;
            Some(
                IndexInfo::new(name, row::list(r, "columns"))
                    .with_unique(row::flag(r, "is_unique"))
                    .with_primary(row::flag(r, "is_primary"))
                    .with_type(row::text(r, "index_type"))
                    .with_partial_predicate(row::text(r, "predicate")),
            )
        })
        .collect()
}

//! Statement execution.
//!
//! `fetch_json_rows` is the single execution primitive every higher layer
//! goes through. Statements without parameters are sent as raw SQL to avoid
//! prepared-statement restrictions; parameterized statements are prepared and
//! bound positionally.
//!
//! Rows are fetched in full: the query gateway reports the true row total,
//! so truncation happens after counting.

use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::DbResult;
use crate::impl_db_dispatch;
use crate::models::{JsonRow, QueryParam};
use futures_util::TryStreamExt;
use std::time::Instant;
use tracing::debug;

/// Execute `sql` with positional `params` and normalize every row.
pub async fn fetch_json_rows(
    pool: &DbPool,
    sql: &str,
    params: &[QueryParam],
) -> DbResult<Vec<JsonRow>> {
    let start = Instant::now();

    let rows = impl_db_dispatch!(pool, {
        MySql(p) => mysql::fetch_rows(p, sql, params).await?,
        Postgres(p) => postgres::fetch_rows(p, sql, params).await?,
        SQLite(p) => sqlite::fetch_rows(p, sql, params).await?,
    });

    debug!(
        sql = %sql,
        params = params.len(),
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Statement executed"
    );

    Ok(rows)
}

/// Generates a backend module with its `fetch_rows`.
macro_rules! backend_fetch {
    ($module:ident, $db:ty, $pool:ty) => {
        mod $module {
            use super::*;

            pub async fn fetch_rows(
                pool: &$pool,
                sql: &str,
                params: &[QueryParam],
            ) -> DbResult<Vec<JsonRow>> {
                let rows = if params.is_empty() {
                    use sqlx::Executor;
                    pool.fetch(sql).try_collect::<Vec<_>>().await?
                } else {
                    let mut query = sqlx::query::<$db>(sql);
                    for param in params {
                        query = match param {
                            QueryParam::Null => query.bind(None::<String>),
                            QueryParam::Bool(v) => query.bind(*v),
                            QueryParam::Int(v) => query.bind(*v),
                            QueryParam::Float(v) => query.bind(*v),
                            QueryParam::String(v) => query.bind(v.as_str()),
                        };
                    }
                    query.fetch_all(pool).await?
                };

                Ok(rows.iter().map(RowToJson::to_json_row).collect())
            }
        }
    };
}

backend_fetch!(mysql, sqlx::MySql, sqlx::MySqlPool);
backend_fetch!(postgres, sqlx::Postgres, sqlx::PgPool);
backend_fetch!(sqlite, sqlx::Sqlite, sqlx::SqlitePool);

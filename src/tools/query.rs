//! Query gateway.
//!
//! This module implements the `run_query` tool: validate that the statement
//! is a single read query, run it on the active session and bound the rows
//! handed back.

use crate::db::ConnectionManager;
use crate::error::DbResult;
use crate::models::{QueryOutput, QueryParam, MAX_QUERY_ROWS};
use crate::tools::sql_validator;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryInput {
    /// SELECT or WITH statement. Anything else is rejected before execution.
    pub sql: String,
    /// Positional parameters (`$1`, `?` placeholders)
    #[serde(default)]
    pub params: Vec<QueryParam>,
}

impl QueryInput {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Handler for read queries.
pub struct QueryToolHandler {
    connection_manager: Arc<ConnectionManager>,
    max_rows: usize,
}

impl QueryToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            connection_manager,
            max_rows: MAX_QUERY_ROWS,
        }
    }

    /// Validate and run a read query, truncating to the row cap.
    ///
    /// Backend failures carry the active dialect's quoting and date-function
    /// hint.
    pub async fn run_query(&self, input: QueryInput) -> DbResult<QueryOutput> {
        let sql = sql_validator::validate_read_only(&input.sql)?;
        let session = self.connection_manager.session().await?;
        let db_type = session.db_type();

        let start = std::time::Instant::now();
        let rows = session
            .execute(sql, &input.params)
            .await
            .map_err(|e| e.with_dialect_hint(db_type))?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let output = QueryOutput::bounded(rows, self.max_rows);
        if output.truncated {
            warn!(
                total_rows = output.total_rows,
                max_rows = output.max_rows,
                "Query result truncated"
            );
        }

        info!(
            db_type = %db_type,
            row_count = output.row_count,
            truncated = output.truncated,
            execution_time_ms,
            "Query executed"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    fn handler() -> QueryToolHandler {
        QueryToolHandler::new(Arc::new(ConnectionManager::default()))
    }

    #[test]
    fn test_query_input_deserialization() {
        let json = r#"{"sql": "SELECT * FROM users WHERE id = $1", "params": [42, "x", null]}"#;
        let input: QueryInput = serde_json::from_str(json).unwrap();
        assert_eq!(
            input.params,
            vec![
                QueryParam::Int(42),
                QueryParam::String("x".to_string()),
                QueryParam::Null
            ]
        );

        let input: QueryInput = serde_json::from_str(r#"{"sql": "SELECT 1"}"#).unwrap();
        assert!(input.params.is_empty());
    }

    #[tokio::test]
    async fn test_validation_precedes_connection_check() {
        let err = handler()
            .run_query(QueryInput::new("  delete   from t"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation { .. }));

        let err = handler()
            .run_query(QueryInput::new("WITH x AS (SELECT 1) SELECT * FROM x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotConnected));
    }
}

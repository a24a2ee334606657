//! Execution plan normalization.

use crate::db::dialect::Dialect;
use crate::db::pool::Session;
use crate::error::DbResult;
use crate::models::{DatabaseType, ExplainResult, JsonRow};
use crate::with_dialect;
use tracing::{debug, warn};

/// Runs a backend's plan statement and reduces its output to an
/// [`ExplainResult`].
pub struct PlanNormalizer;

impl PlanNormalizer {
    /// Explain `sql` on the session's backend.
    ///
    /// The statement is assumed to have passed read-only validation already.
    pub async fn explain(session: &Session, sql: &str) -> DbResult<ExplainResult> {
        let db_type = session.db_type();
        let statement = with_dialect!(db_type, |d| d.explain_statement(sql));
        debug!(db_type = %db_type, "Requesting execution plan");

        let rows = session
            .execute(&statement, &[])
            .await
            .map_err(|e| e.with_dialect_hint(db_type))?;

        Ok(Self::normalize(db_type, sql, &rows))
    }

    /// Reduce raw plan rows. A plan that cannot be fully read yields the
    /// partial result plus a warning naming the problem.
    pub fn normalize(db_type: DatabaseType, sql: &str, rows: &[JsonRow]) -> ExplainResult {
        let mut result = ExplainResult::new();
        if let Err(e) = with_dialect!(db_type, |d| d.normalize_plan(sql, rows, &mut result)) {
            warn!(db_type = %db_type, error = %e, "Execution plan only partially parsed");
            result.warnings.push(e.to_string());
        }
        result.finalize();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(key: &str, value: serde_json::Value) -> JsonRow {
        let mut r = JsonRow::new();
        r.insert(key.to_string(), value);
        r
    }

    #[test]
    fn test_postgres_plan_text_is_parsed() {
        let plan = json!([{
            "Plan": {
                "Node Type": "Index Scan",
                "Relation Name": "users",
                "Index Name": "users_pkey",
                "Plan Rows": 1
            }
        }]);
        let rows = vec![row("QUERY PLAN", json!(plan.to_string()))];
        let result = PlanNormalizer::normalize(DatabaseType::PostgreSQL, "SELECT 1", &rows);
        assert_eq!(result.indexes_used, vec!["users_pkey"]);
        assert_eq!(result.estimated_rows, Some(1));
        assert!(result.sequential_scans.is_empty());
    }

    #[test]
    fn test_malformed_plan_yields_warning() {
        let rows = vec![row("QUERY PLAN", json!("{not json"))];
        let result = PlanNormalizer::normalize(DatabaseType::PostgreSQL, "SELECT 1", &rows);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("Could not parse execution plan")));
    }
}

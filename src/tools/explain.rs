//! Explain tool.

use crate::db::{ConnectionManager, PlanNormalizer};
use crate::error::DbResult;
use crate::models::ExplainResult;
use crate::tools::sql_validator;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for the explain tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainInput {
    /// SELECT or WITH statement to plan
    pub sql: String,
}

/// Handler for execution plan requests.
pub struct ExplainToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl ExplainToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Validate, plan and normalize `input.sql`.
    ///
    /// Validation runs before the session is looked up, so a write statement
    /// is rejected even without a connection.
    pub async fn explain(&self, input: ExplainInput) -> DbResult<ExplainResult> {
        let sql = sql_validator::validate_read_only(&input.sql)?;
        let session = self.connection_manager.session().await?;

        let result = PlanNormalizer::explain(&session, sql).await?;

        info!(
            db_type = %session.db_type(),
            indexes = result.indexes_used.len(),
            sequential_scans = result.sequential_scans.len(),
            "Explained query"
        );
        Ok(result)
    }
}

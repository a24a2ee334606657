//! Error types for db-lens.
//!
//! This module defines the error taxonomy using `thiserror`. Each variant
//! carries enough context for a caller to understand the failure and, where
//! possible, a suggestion or dialect hint for correcting it.

use crate::models::DatabaseType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Not connected: call connect with a connection string first")]
    NotConnected,

    #[error("Invalid statement: {message}")]
    Validation { message: String },

    #[error("Query failed: {message}")]
    Query {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        /// Dialect conventions that apply to the failing statement
        hint: Option<String>,
    },

    #[error("Could not parse execution plan: {message}")]
    PlanParse { message: String },

    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
            hint: None,
        }
    }

    pub fn plan_parse(message: impl Into<String>) -> Self {
        Self::PlanParse {
            message: message.into(),
        }
    }

    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach the quoting and date-function conventions of `db_type` to a
    /// query error. Other variants pass through unchanged.
    pub fn with_dialect_hint(self, db_type: DatabaseType) -> Self {
        match self {
            Self::Query {
                message, sql_state, ..
            } => Self::Query {
                message,
                sql_state,
                hint: Some(db_type.query_hint().to_string()),
            },
            other => other,
        }
    }

    /// Get the suggestion or hint for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Query { hint, .. } => hint.as_deref(),
            Self::NotConnected => Some("Connect to a database before running this operation"),
            Self::Validation { .. } => Some("Only SELECT or WITH queries are accepted"),
            Self::TableNotFound { .. } => Some("Use list_tables to see the available tables"),
            _ => None,
        }
    }

    /// Check if the caller can recover by reconnecting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::NotConnected)
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::query("No rows returned", None),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out waiting for a pooled connection",
                "The server may be overloaded; retry or raise --acquire-timeout",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found in result: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_not_connected_message() {
        assert!(DbError::NotConnected.to_string().contains("Not connected"));
        assert!(DbError::NotConnected.is_recoverable());
    }

    #[test]
    fn test_query_error_gets_dialect_hint() {
        let err = DbError::query("syntax error at or near \"`\"", Some("42601".to_string()))
            .with_dialect_hint(DatabaseType::PostgreSQL);
        match &err {
            DbError::Query { hint, sql_state, .. } => {
                assert_eq!(sql_state.as_deref(), Some("42601"));
                assert!(hint.as_deref().unwrap().contains("double quotes"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_dialect_hint_leaves_other_errors_alone() {
        let err = DbError::validation("DELETE").with_dialect_hint(DatabaseType::MySQL);
        assert!(matches!(err, DbError::Validation { .. }));
    }

    #[test]
    fn test_validation_not_recoverable_by_reconnect() {
        assert!(!DbError::validation("nope").is_recoverable());
        assert!(DbError::connection("err", "sugg").is_recoverable());
    }
}

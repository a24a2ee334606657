//! Configuration handling for db-lens.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::models::{ChartType, DatabaseType};
use clap::{Parser, Subcommand};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool settings handed to the connection manager.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PoolOptions {
    /// Maximum connections in pool (default: 5; ignored for SQLite, which always uses 1)
    pub max_connections: Option<u32>,
    /// Idle timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
}

impl PoolOptions {
    /// Pool size for a backend. SQLite is pinned to a single connection.
    pub fn max_connections_for(&self, db_type: DatabaseType) -> u32 {
        match db_type {
            DatabaseType::SQLite => DEFAULT_MAX_CONNECTIONS_SQLITE,
            _ => self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        }
    }

    pub fn idle_timeout_or_default(&self) -> u64 {
        self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS)
    }

    pub fn acquire_timeout_or_default(&self) -> u64 {
        self.acquire_timeout_secs
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS)
    }

    /// Validate pool options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == Some(0) {
            return Err("max_connections must be greater than 0".to_string());
        }
        if self.acquire_timeout_secs == Some(0) {
            return Err("acquire_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// One operation per invocation.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List tables with their estimated row counts
    ListTables,

    /// Describe a table's columns, foreign keys and indexes
    Describe {
        /// Table name
        table: String,
    },

    /// Print the schema of every table (capped at 100 tables)
    Schema,

    /// Explain a read query and flag missing index usage
    Explain {
        /// SELECT or WITH statement
        sql: String,
    },

    /// Run a read query (results capped at 1000 rows)
    Query {
        /// SELECT or WITH statement
        sql: String,
    },

    /// Run a read query and print a chart configuration as JSON
    Chart {
        /// SELECT or WITH statement; the first column is the x-axis
        sql: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// area, bar, line or pie
        #[arg(long = "type", default_value = "bar")]
        chart_type: ChartType,

        /// Series columns (default: every column after the first)
        #[arg(long, value_delimiter = ',')]
        series: Vec<String>,

        #[arg(long)]
        stacked: bool,
    },
}

/// Configuration for db-lens.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "db-lens",
    about = "Read-only introspection, query and explain-plan analysis for PostgreSQL, MySQL and SQLite",
    version,
    author
)]
pub struct Config {
    /// Connection string: postgres://, mysql://, sqlite: or a path to a SQLite file
    #[arg(short = 'd', long = "database", value_name = "URL", env = "DB_LENS_DATABASE")]
    pub database: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, env = "DB_LENS_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "DB_LENS_JSON_LOGS")]
    pub json_logs: bool,

    /// Maximum pooled connections for PostgreSQL/MySQL
    #[arg(long, env = "DB_LENS_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Seconds to wait for a pooled connection
    #[arg(long, default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS, env = "DB_LENS_ACQUIRE_TIMEOUT")]
    pub acquire_timeout: u64,

    /// Seconds before an idle pooled connection is closed
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS, env = "DB_LENS_IDLE_TIMEOUT")]
    pub idle_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Pool settings derived from the flags.
    pub fn pool_options(&self) -> Result<PoolOptions, String> {
        let options = PoolOptions {
            max_connections: self.max_connections,
            idle_timeout_secs: Some(self.idle_timeout),
            acquire_timeout_secs: Some(self.acquire_timeout),
        };
        options.validate()?;
        Ok(options)
    }
}

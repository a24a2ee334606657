//! db-lens - command line entry point.
//!
//! Connects read-only to one database, runs a single operation and prints
//! its payload to stdout. Logs go to stderr.

use db_lens::config::{Command, Config};
use db_lens::db::ConnectionManager;
use db_lens::error::DbResult;
use db_lens::tools::format::{format_explain_result, format_query_output};
use db_lens::tools::{
    ChartInput, ChartToolHandler, ConnectInput, ConnectionToolHandler, DescribeTableInput,
    ExplainInput, ExplainToolHandler, QueryInput, QueryToolHandler, SchemaToolHandler,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(config: Config, manager: Arc<ConnectionManager>) -> DbResult<String> {
    let status = ConnectionToolHandler::new(manager.clone())
        .connect(ConnectInput {
            connection_string: config.database,
        })
        .await?;
    info!("{}", status);

    let payload = match config.command {
        Command::ListTables => SchemaToolHandler::new(manager).list_tables().await?,
        Command::Describe { table } => {
            SchemaToolHandler::new(manager)
                .describe_table(DescribeTableInput { table })
                .await?
        }
        Command::Schema => SchemaToolHandler::new(manager).get_full_schema().await?,
        Command::Explain { sql } => {
            let result = ExplainToolHandler::new(manager)
                .explain(ExplainInput { sql })
                .await?;
            format_explain_result(&result)
        }
        Command::Query { sql } => {
            let output = QueryToolHandler::new(manager)
                .run_query(QueryInput::new(sql))
                .await?;
            format_query_output(&output)
        }
        Command::Chart {
            sql,
            title,
            description,
            chart_type,
            series,
            stacked,
        } => {
            let input = ChartInput {
                title,
                description,
                chart_type,
                sql,
                series: (!series.is_empty()).then_some(series),
                stacked: stacked.then_some(true),
            };
            let config = ChartToolHandler::new(QueryToolHandler::new(manager))
                .build_chart(input)
                .await?;
            serde_json::to_string_pretty(&config)
                .map_err(|e| db_lens::DbError::internal(e.to_string()))?
        }
    };
    Ok(payload)
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse_args();
    init_tracing(&config);

    let pool_options = match config.pool_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let manager = Arc::new(ConnectionManager::new(pool_options));
    let result = run(config, manager.clone()).await;
    manager.disconnect().await;

    match result {
        Ok(payload) => {
            println!("{}", payload.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Operation failed");
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

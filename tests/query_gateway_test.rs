//! Read-only query gateway against real SQLite files.

mod common;

use common::{connect, users_db};
use db_lens::db::ConnectionManager;
use db_lens::error::DbError;
use db_lens::models::{QueryParam, MAX_QUERY_ROWS};
use db_lens::tools::format::format_query_output;
use db_lens::tools::{QueryInput, QueryToolHandler};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_select_returns_normalized_rows() {
    let db = users_db().await;
    let handler = QueryToolHandler::new(connect(&db).await);

    let output = handler
        .run_query(QueryInput::new("SELECT id, name FROM users ORDER BY id"))
        .await
        .unwrap();

    assert_eq!(output.columns, vec!["id", "name"]);
    assert_eq!(output.row_count, 3);
    assert!(!output.truncated);
    assert_eq!(output.rows[0]["id"], json!(1));
    assert_eq!(output.rows[0]["name"], json!("ann"));

    let text = format_query_output(&output);
    assert!(text.contains("| ann  |"));
    assert!(text.contains("3 rows in set"));
}

#[tokio::test]
async fn test_parameters_are_bound() {
    let db = users_db().await;
    let handler = QueryToolHandler::new(connect(&db).await);

    let input = QueryInput {
        sql: "SELECT name FROM users WHERE id = ? OR name = ?".to_string(),
        params: vec![QueryParam::Int(2), QueryParam::from("cy")],
    };
    let output = handler.run_query(input).await.unwrap();

    let names: Vec<_> = output.rows.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("bob"), json!("cy")]);
}

#[tokio::test]
async fn test_value_types() {
    let db = users_db().await;
    let handler = QueryToolHandler::new(connect(&db).await);

    let output = handler
        .run_query(QueryInput::new(
            "SELECT 1.5 AS f, NULL AS n, X'00FF' AS b, 'héllo' AS s",
        ))
        .await
        .unwrap();

    let row = &output.rows[0];
    assert_eq!(row["f"], json!(1.5));
    assert_eq!(row["n"], json!(null));
    assert_eq!(row["b"], json!("AP8="));
    assert_eq!(row["s"], json!("héllo"));
}

#[tokio::test]
async fn test_rows_truncated_with_total() {
    let db = users_db().await;
    let handler = QueryToolHandler::new(connect(&db).await);

    let output = handler
        .run_query(QueryInput::new(
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1500) \
             SELECT x FROM c",
        ))
        .await
        .unwrap();

    assert!(output.truncated);
    assert_eq!(output.row_count, MAX_QUERY_ROWS);
    assert_eq!(output.rows.len(), MAX_QUERY_ROWS);
    assert_eq!(output.total_rows, 1500);
    assert_eq!(
        output.truncation_note().as_deref(),
        Some("Showing 1000 of 1500 rows (result capped at 1000 rows)")
    );
}

#[tokio::test]
async fn test_writes_rejected_by_validator() {
    let db = users_db().await;
    let handler = QueryToolHandler::new(connect(&db).await);

    for sql in ["DELETE FROM users", "  delete   from users", "SELECT 1; DROP TABLE users"] {
        let err = handler.run_query(QueryInput::new(sql)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation { .. }), "{sql}");
    }
}

#[tokio::test]
async fn test_validation_before_connection() {
    let handler = QueryToolHandler::new(Arc::new(ConnectionManager::default()));

    let err = handler
        .run_query(QueryInput::new("DELETE FROM t"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));

    let err = handler
        .run_query(QueryInput::new("WITH x AS (SELECT 1) SELECT * FROM x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotConnected));
}

#[tokio::test]
async fn test_session_rejects_writes_past_validator() {
    let db = users_db().await;
    let manager = connect(&db).await;
    let session = manager.session().await.unwrap();
    assert!(session.is_read_only());

    let err = session
        .execute("INSERT INTO users (name) VALUES ('eve')", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Query { .. }));

    let output = QueryToolHandler::new(manager)
        .run_query(QueryInput::new("SELECT COUNT(*) AS n FROM users"))
        .await
        .unwrap();
    assert_eq!(output.rows[0]["n"], json!(3));
}

#[tokio::test]
async fn test_query_error_has_hint() {
    let db = users_db().await;
    let handler = QueryToolHandler::new(connect(&db).await);

    let err = handler
        .run_query(QueryInput::new("SELECT nope FROM users"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Query { .. }));
    assert!(err.suggestion().is_some());
}

//! Schema introspection against real SQLite files.

mod common;

use common::{connect, create_db, users_db};
use db_lens::db::{SchemaInspector, FULL_SCHEMA_TABLE_LIMIT, NO_TABLES_MESSAGE};
use db_lens::error::DbError;
use db_lens::models::TableSummary;
use db_lens::tools::{DescribeTableInput, SchemaToolHandler};

#[tokio::test]
async fn test_list_and_describe_users() {
    let db = users_db().await;
    let manager = connect(&db).await;
    let session = manager.session().await.unwrap();

    let tables = SchemaInspector::list_tables(&session).await.unwrap();
    assert_eq!(tables, vec![TableSummary::new("users", 3)]);

    let description = SchemaInspector::describe_table(&session, "users")
        .await
        .unwrap();
    let id = &description.columns[0];
    assert_eq!(id.name, "id");
    assert!(id.is_primary_key);
    assert!(!id.nullable);

    let name = &description.columns[1];
    assert_eq!(name.name, "name");
    assert_eq!(name.data_type, "TEXT");
    assert!(!name.is_primary_key);
    assert!(!name.nullable);

    assert!(description.foreign_keys.is_empty());
}

#[tokio::test]
async fn test_empty_database_lists_message() {
    let db = create_db(&[]).await;
    let manager = connect(&db).await;

    let handler = SchemaToolHandler::new(manager.clone());
    assert_eq!(handler.list_tables().await.unwrap(), NO_TABLES_MESSAGE);
    assert_eq!(handler.get_full_schema().await.unwrap(), NO_TABLES_MESSAGE);
}

#[tokio::test]
async fn test_tables_sorted_by_name() {
    let db = create_db(&[
        "CREATE TABLE zebra (id INTEGER)",
        "CREATE TABLE apple (id INTEGER)",
        "CREATE TABLE mango (id INTEGER)",
        "CREATE VIEW apple_view AS SELECT * FROM apple",
    ])
    .await;
    let manager = connect(&db).await;
    let session = manager.session().await.unwrap();

    let names: Vec<String> = SchemaInspector::list_tables(&session)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["apple", "mango", "zebra"]);
}

#[tokio::test]
async fn test_foreign_keys_and_indexes() {
    let db = create_db(&[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT UNIQUE, active INTEGER)",
        "CREATE TABLE teams (code TEXT PRIMARY KEY)",
        "CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            team_code TEXT REFERENCES teams,
            status TEXT DEFAULT 'open'
        )",
        "CREATE INDEX idx_orders_user_status ON orders(user_id, status)",
        "CREATE INDEX idx_orders_open ON orders(user_id) WHERE status = 'open'",
    ])
    .await;
    let manager = connect(&db).await;
    let session = manager.session().await.unwrap();

    let orders = SchemaInspector::describe_table(&session, "orders")
        .await
        .unwrap();

    let mut fks: Vec<(String, String, String)> = orders
        .foreign_keys
        .iter()
        .map(|fk| {
            (
                fk.column.clone(),
                fk.referenced_table.clone(),
                fk.referenced_column.clone(),
            )
        })
        .collect();
    fks.sort();
    assert_eq!(
        fks,
        vec![
            ("team_code".to_string(), "teams".to_string(), "code".to_string()),
            ("user_id".to_string(), "users".to_string(), "id".to_string()),
        ]
    );

    let composite = orders
        .indexes
        .iter()
        .find(|i| i.name == "idx_orders_user_status")
        .unwrap();
    assert_eq!(composite.columns, vec!["user_id", "status"]);
    assert!(!composite.unique);
    assert!(composite.partial_predicate.is_none());

    let partial = orders
        .indexes
        .iter()
        .find(|i| i.name == "idx_orders_open")
        .unwrap();
    assert_eq!(partial.partial_predicate.as_deref(), Some("status = 'open'"));

    let status = orders.columns.iter().find(|c| c.name == "status").unwrap();
    assert_eq!(status.default_value.as_deref(), Some("'open'"));
    assert!(status.nullable);

    let users = SchemaInspector::describe_table(&session, "users")
        .await
        .unwrap();
    let unique = users
        .indexes
        .iter()
        .find(|i| i.columns == vec!["email"])
        .unwrap();
    assert!(unique.unique);
    assert!(!unique.is_primary);
}

#[tokio::test]
async fn test_describe_missing_table() {
    let db = users_db().await;
    let manager = connect(&db).await;

    let err = SchemaToolHandler::new(manager)
        .describe_table(DescribeTableInput {
            table: "nope".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::TableNotFound { ref table } if table == "nope"));
}

#[tokio::test]
async fn test_full_schema_capped_at_limit() {
    let statements: Vec<String> = (0..150)
        .map(|i| format!("CREATE TABLE t{:03} (id INTEGER PRIMARY KEY, v TEXT)", i))
        .collect();
    let refs: Vec<&str> = statements.iter().map(String::as_str).collect();
    let db = create_db(&refs).await;
    let manager = connect(&db).await;

    let schema = SchemaToolHandler::new(manager)
        .get_full_schema()
        .await
        .unwrap();

    assert!(schema.starts_with(&format!(
        "Database schema ({} tables):",
        FULL_SCHEMA_TABLE_LIMIT
    )));
    assert_eq!(
        schema.lines().filter(|l| l.starts_with("## ")).count(),
        FULL_SCHEMA_TABLE_LIMIT
    );
    assert!(schema.contains("## t099\n"));
    assert!(!schema.contains("## t100\n"));
    assert_eq!(
        schema.matches("Estimated rows: 0").count(),
        FULL_SCHEMA_TABLE_LIMIT
    );
}

#[tokio::test]
async fn test_describe_table_text() {
    let db = users_db().await;
    let manager = connect(&db).await;

    let text = SchemaToolHandler::new(manager.clone())
        .describe_table(DescribeTableInput {
            table: "users".to_string(),
        })
        .await
        .unwrap();
    assert!(text.starts_with("## users\n"));
    assert!(text.contains("  - id INTEGER PRIMARY KEY NOT NULL"));
    assert!(text.contains("  - name TEXT NOT NULL"));

    let list = SchemaToolHandler::new(manager).list_tables().await.unwrap();
    assert!(list.contains("users (~3 rows)"));
}

#[tokio::test]
async fn test_partial_index_with_quoted_name_containing_where() {
    let db = create_db(&[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
        r#"CREATE INDEX "idx where" ON users(name) WHERE name <> 'where'"#,
    ])
    .await;
    let manager = connect(&db).await;
    let session = manager.session().await.unwrap();

    let users = SchemaInspector::describe_table(&session, "users")
        .await
        .unwrap();
    let index = users.indexes.iter().find(|i| i.name == "idx where").unwrap();
    assert_eq!(index.columns, vec!["name"]);
    assert_eq!(index.partial_predicate.as_deref(), Some("name <> 'where'"));
}

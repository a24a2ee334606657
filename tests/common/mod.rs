//! Shared fixtures: throwaway SQLite files built with a writable pool, then
//! opened read-only through the connection manager.

#![allow(dead_code)]

use db_lens::db::ConnectionManager;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn path_str(&self) -> &str {
        self.path.to_str().expect("temp path is UTF-8")
    }
}

/// Create a database file and run `statements` against it.
pub async fn create_db(statements: &[&str]) -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("test.db");

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create test database");

    for statement in statements {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .unwrap_or_else(|e| panic!("setup statement failed: {statement}: {e}"));
    }
    pool.close().await;

    TestDb { _dir: dir, path }
}

/// The `users(id INTEGER PRIMARY KEY, name TEXT NOT NULL)` table with 3 rows.
pub async fn users_db() -> TestDb {
    create_db(&[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        "INSERT INTO users (name) VALUES ('ann'), ('bob'), ('cy')",
    ])
    .await
}

pub async fn connect(db: &TestDb) -> Arc<ConnectionManager> {
    let manager = Arc::new(ConnectionManager::default());
    manager
        .connect(db.path_str())
        .await
        .expect("Failed to connect to test database");
    manager
}

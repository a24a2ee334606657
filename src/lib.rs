//! db-lens library.
//!
//! Read-only introspection, querying and execution-plan normalization for
//! PostgreSQL, MySQL and SQLite behind one connection manager.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod tools;

pub use config::Config;
pub use db::ConnectionManager;
pub use error::{DbError, DbResult};

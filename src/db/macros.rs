//! Dispatch macros for reducing per-backend duplication.
//!
//! Both macros expand at compile time into plain `match` statements, so every
//! backend arm is statically typed against its own driver.

/// Match on a `DbPool`, binding the backend-specific pool in each arm.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     MySql(p) => do_mysql(p),
///     Postgres(p) => do_postgres(p),
///     SQLite(p) => do_sqlite(p),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

/// Run `body` with the dialect strategy for a `DatabaseType` bound to `d`.
///
/// The body is expanded once per backend, so it may `.await` and may call
/// any method of the `Dialect` trait.
///
/// ```ignore
/// let tables = with_dialect!(session.db_type(), |d| d.list_tables(&session).await)?;
/// ```
#[macro_export]
macro_rules! with_dialect {
    ($db_type:expr, |$d:ident| $body:expr) => {
        match $db_type {
            $crate::models::DatabaseType::PostgreSQL => {
                let $d = $crate::db::dialect::Postgres;
                $body
            }
            $crate::models::DatabaseType::MySQL => {
                let $d = $crate::db::dialect::MySql;
                $body
            }
            $crate::models::DatabaseType::SQLite => {
                let $d = $crate::db::dialect::Sqlite;
                $body
            }
        }
    };
}

pub use impl_db_dispatch;
pub use with_dialect;

#[cfg(test)]
mod tests {
    use crate::db::dialect::Dialect;
    use crate::models::DatabaseType;

    #[test]
    fn test_with_dialect_selects_matching_strategy() {
        for db_type in [
            DatabaseType::PostgreSQL,
            DatabaseType::MySQL,
            DatabaseType::SQLite,
        ] {
            assert_eq!(with_dialect!(db_type, |d| d.db_type()), db_type);
        }
    }
}

//! Core traits for SQL database access.
//!
//! - [`SqlExecutor`] - Parameterized statements and queries
//! - [`Transaction`] - Transaction lifecycle management
//! - [`SqlClient`] - Connection pool and transaction creation

use async_trait::async_trait;

use crate::db::row::{Params, RowStream};
use crate::error::AppError;

/// Executes SQL against a database.
///
/// Values are always bound as positional parameters (`$1`, `$2`, ...),
/// never interpolated into the statement text.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes one or more statements without parameters.
    ///
    /// Use this for DDL (CREATE TABLE, CREATE INDEX).
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError>;

    /// Executes a query and returns a stream of result rows.
    async fn query_sql(&self, sql: &str, params: Params) -> Result<RowStream<'_>, AppError>;

    /// Executes a statement and returns the number of affected rows.
    async fn run_sql(&self, sql: &str, params: Params) -> Result<u64, AppError>;
}

/// Transaction lifecycle management.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commits the transaction, making all changes permanent.
    async fn commit(self) -> Result<(), AppError>;

    /// Rolls back the transaction, discarding all changes.
    async fn rollback(self) -> Result<(), AppError>;
}

/// A database client that can begin transactions.
///
/// Implementations wrap a connection pool and provide auto-commit
/// statements via the executor methods, plus explicit transactions via
/// [`begin`](SqlClient::begin).
#[async_trait]
pub trait SqlClient: SqlExecutor {
    /// The transaction type returned by this client.
    type Tx<'a>: Transaction + SqlExecutor
    where
        Self: 'a;

    /// Begins a new transaction.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let txn = client.begin().await?;
    /// txn.query("UPDATE posts SET mapped_id = $1 WHERE post_id = $2")
    ///     .bind(new_id)
    ///     .bind(legacy_id)
    ///     .run()
    ///     .await?;
    /// txn.commit().await?;
    /// ```
    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}

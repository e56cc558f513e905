//! Query builder for fluent SQL statement construction.

use futures::TryStreamExt;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::db::row::{Params, Row, RowStream};
use crate::db::traits::SqlExecutor;
use crate::error::AppError;

/// A builder for constructing and executing parameterized SQL.
///
/// Each call to [`bind`](Query::bind) appends the next positional parameter.
///
/// # Example
///
/// ```ignore
/// let rows = Query::new(&client, "SELECT * FROM posts WHERE post_id = $1")
///     .bind(42)
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
    sql: String,
    params: Params,
}

impl<'a, E: SqlExecutor + ?Sized> Query<'a, E> {
    pub fn new(executor: &'a E, sql: &str) -> Self {
        Self {
            executor,
            sql: sql.to_string(),
            params: Params::new(),
        }
    }

    /// Binds the next positional parameter.
    ///
    /// Values that fail to serialize are bound as NULL.
    pub fn bind<T: Serialize>(mut self, value: T) -> Self {
        let json_value = serde_json::to_value(value).unwrap_or(JsonValue::Null);
        self.params.push(json_value);
        self
    }

    /// Binds a parameter that's already a JSON value.
    pub fn bind_raw(mut self, value: JsonValue) -> Self {
        self.params.push(value);
        self
    }

    /// Executes the query and returns a stream of rows.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        self.executor.query_sql(&self.sql, self.params).await
    }

    /// Executes the query and collects all rows into a vector.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the query and returns the first row, if any.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        use futures::StreamExt;
        let mut stream = self.execute().await?;
        stream.next().await.transpose()
    }

    /// Executes the statement and returns the affected row count.
    pub async fn run(self) -> Result<u64, AppError> {
        self.executor.run_sql(&self.sql, self.params).await
    }
}

/// Extension trait providing a convenient `query()` method.
///
/// Automatically implemented for all [`SqlExecutor`] types, allowing
/// `executor.query("...")` instead of `Query::new(&executor, "...")`.
pub trait QueryExt: SqlExecutor {
    fn query(&self, sql: &str) -> Query<'_, Self> {
        Query::new(self, sql)
    }
}

impl<E: SqlExecutor + ?Sized> QueryExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockExecutor {
        expected_sql: String,
        expected_params: Params,
    }

    #[async_trait::async_trait]
    impl SqlExecutor for MockExecutor {
        async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
            assert_eq!(sql, self.expected_sql);
            Ok(())
        }

        async fn query_sql(&self, sql: &str, params: Params) -> Result<RowStream<'_>, AppError> {
            assert_eq!(sql, self.expected_sql);
            assert_eq!(params, self.expected_params);
            let row = Row::from([("n", json!(1))]);
            Ok(Box::pin(futures::stream::iter(vec![Ok(row)])))
        }

        async fn run_sql(&self, sql: &str, params: Params) -> Result<u64, AppError> {
            assert_eq!(sql, self.expected_sql);
            assert_eq!(params, self.expected_params);
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_query_binds_in_order() {
        let executor = MockExecutor {
            expected_sql: "SELECT 1 AS n WHERE $1 < $2".to_string(),
            expected_params: vec![json!(1), json!("b")],
        };

        let rows = executor
            .query("SELECT 1 AS n WHERE $1 < $2")
            .bind(1)
            .bind("b")
            .fetch_all()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_query_fetch_one() {
        let executor = MockExecutor {
            expected_sql: "SELECT 1 AS n".to_string(),
            expected_params: vec![],
        };

        let row = executor.query("SELECT 1 AS n").fetch_one().await.unwrap();
        assert_eq!(row.unwrap().int("n"), Some(1));
    }

    #[tokio::test]
    async fn test_query_run() {
        let executor = MockExecutor {
            expected_sql: "UPDATE t SET a = $1".to_string(),
            expected_params: vec![JsonValue::Null],
        };

        let affected = executor
            .query("UPDATE t SET a = $1")
            .bind(Option::<String>::None)
            .run()
            .await
            .unwrap();
        assert_eq!(affected, 1);
    }
}

//! Document store abstraction for the target schema.
//!
//! Documents are JSON objects addressed by `(collection, id)`. Field paths
//! are dotted (`linkedTo.reference`) and compared as text.

mod postgres;

pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::AppError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document under a caller-chosen ID.
    async fn insert(&self, collection: &str, id: &str, body: JsonValue) -> Result<(), AppError>;

    async fn find(&self, collection: &str, id: &str) -> Result<Option<JsonValue>, AppError>;

    /// Documents whose ID is in `ids`; missing IDs are skipped.
    async fn find_many(&self, collection: &str, ids: &[String]) -> Result<Vec<JsonValue>, AppError>;

    async fn find_by_field(
        &self,
        collection: &str,
        path: &str,
        value: &str,
    ) -> Result<Vec<JsonValue>, AppError>;

    /// Shallow-merges `patch` into the document. Returns false if it does not exist.
    async fn update(&self, collection: &str, id: &str, patch: JsonValue) -> Result<bool, AppError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError>;

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<u64, AppError>;

    /// Deletes every document whose field matches and returns their IDs.
    async fn delete_where(
        &self,
        collection: &str,
        path: &str,
        value: &str,
    ) -> Result<Vec<String>, AppError>;

    async fn exists(&self, collection: &str, id: &str) -> Result<bool, AppError>;

    /// Appends `value` to the array at `field` of each listed document.
    async fn push_to_array(
        &self,
        collection: &str,
        ids: &[String],
        field: &str,
        value: JsonValue,
    ) -> Result<u64, AppError>;

    /// Removes every element equal to `value` from `field` across the collection.
    async fn pull_from_array(
        &self,
        collection: &str,
        field: &str,
        value: JsonValue,
    ) -> Result<u64, AppError>;

    async fn list_ids(&self, collection: &str) -> Result<Vec<String>, AppError>;
}

/// Splits a dotted field path into JSON path segments.
pub fn field_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path() {
        assert_eq!(field_path("linkedTo.reference"), vec!["linkedTo", "reference"]);
        assert_eq!(field_path("email"), vec!["email"]);
        assert!(field_path("").is_empty());
    }
}

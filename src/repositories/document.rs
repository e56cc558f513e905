//! Typed access to target documents.

use serde_json::{json, Value as JsonValue};

use crate::context::{AppDocuments, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::Document;

/// Repository for typed document CRUD over the document store.
#[derive(FromContext, Clone)]
pub struct DocumentRepository {
    documents: AppDocuments,
}

impl DocumentRepository {
    pub fn new(documents: AppDocuments) -> Self {
        Self { documents }
    }

    /// Insert a document under its pre-generated ID.
    pub async fn create<T: Document>(&self, document: &T) -> Result<(), AppError> {
        let body = serde_json::to_value(document)?;
        self.documents
            .insert(T::COLLECTION, document.id(), body)
            .await
    }

    pub async fn find<T: Document>(&self, id: &str) -> Result<Option<T>, AppError> {
        self.documents
            .find(T::COLLECTION, id)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(AppError::from)
    }

    pub async fn find_many<T: Document>(&self, ids: &[String]) -> Result<Vec<T>, AppError> {
        self.documents
            .find_many(T::COLLECTION, ids)
            .await?
            .into_iter()
            .map(|body| serde_json::from_value(body).map_err(AppError::from))
            .collect()
    }

    /// Documents whose dotted field path equals `value` as text.
    pub async fn find_by_field<T: Document>(
        &self,
        path: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        self.documents
            .find_by_field(T::COLLECTION, path, value)
            .await?
            .into_iter()
            .map(|body| serde_json::from_value(body).map_err(AppError::from))
            .collect()
    }

    /// Shallow-merge `patch` into a document. Returns false if it is gone.
    pub async fn update<T: Document>(&self, id: &str, patch: JsonValue) -> Result<bool, AppError> {
        self.documents.update(T::COLLECTION, id, patch).await
    }

    /// Overwrite a whole document, keeping its ID.
    pub async fn replace<T: Document>(&self, document: &T) -> Result<bool, AppError> {
        let body = serde_json::to_value(document)?;
        self.documents
            .update(T::COLLECTION, document.id(), body)
            .await
    }

    pub async fn exists_in(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        self.documents.exists(collection, id).await
    }

    pub async fn delete_in(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        self.documents.delete(collection, id).await
    }

    pub async fn delete_many<T: Document>(&self, ids: &[String]) -> Result<u64, AppError> {
        self.documents.delete_many(T::COLLECTION, ids).await
    }

    /// Delete every document whose field matches and return their IDs.
    pub async fn delete_where<T: Document>(
        &self,
        path: &str,
        value: &str,
    ) -> Result<Vec<String>, AppError> {
        self.documents.delete_where(T::COLLECTION, path, value).await
    }

    /// Record `{model, reference}` in the `contributions` of each user.
    pub async fn push_contribution(
        &self,
        user_ids: &[String],
        model: &str,
        reference: &str,
    ) -> Result<u64, AppError> {
        self.documents
            .push_to_array(
                "users",
                user_ids,
                "contributions",
                json!({ "model": model, "reference": reference }),
            )
            .await
    }

    /// Remove `{model, reference}` from every user's `contributions`.
    pub async fn pull_contribution(&self, model: &str, reference: &str) -> Result<u64, AppError> {
        self.documents
            .pull_from_array(
                "users",
                "contributions",
                json!({ "model": model, "reference": reference }),
            )
            .await
    }

    pub async fn list_ids(&self, collection: &str) -> Result<Vec<String>, AppError> {
        self.documents.list_ids(collection).await
    }
}

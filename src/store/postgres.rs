//! JSONB document store on PostgreSQL.
//!
//! All collections share the `documents` table created by the target
//! schema steps.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::db::backends::postgres::PostgresClient;
use crate::db::{QueryExt, Row};
use crate::error::AppError;
use crate::store::{field_path, DocumentStore};

#[derive(Clone)]
pub struct PgDocumentStore {
    client: PostgresClient,
}

impl PgDocumentStore {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PostgresClient {
        &self.client
    }
}

fn bodies(rows: Vec<Row>) -> Result<Vec<JsonValue>, AppError> {
    rows.into_iter().map(|r| r.get::<JsonValue>("body")).collect()
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, id: &str, body: JsonValue) -> Result<(), AppError> {
        self.client
            .query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3::jsonb)")
            .bind(collection)
            .bind(id)
            .bind_raw(body)
            .run()
            .await?;
        Ok(())
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<JsonValue>, AppError> {
        self.client
            .query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_one()
            .await?
            .map(|r| r.get("body"))
            .transpose()
    }

    async fn find_many(&self, collection: &str, ids: &[String]) -> Result<Vec<JsonValue>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = self
            .client
            .query(
                "SELECT body FROM documents
                 WHERE collection = $1 AND id = ANY($2::text[])
                 ORDER BY array_position($2::text[], id)",
            )
            .bind(collection)
            .bind(ids)
            .fetch_all()
            .await?;
        bodies(rows)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        path: &str,
        value: &str,
    ) -> Result<Vec<JsonValue>, AppError> {
        let rows = self
            .client
            .query("SELECT body FROM documents WHERE collection = $1 AND body #>> $2::text[] = $3")
            .bind(collection)
            .bind(field_path(path))
            .bind(value)
            .fetch_all()
            .await?;
        bodies(rows)
    }

    async fn update(&self, collection: &str, id: &str, patch: JsonValue) -> Result<bool, AppError> {
        let affected = self
            .client
            .query(
                "UPDATE documents SET body = body || $3::jsonb, updated_at = NOW()
                 WHERE collection = $1 AND id = $2",
            )
            .bind(collection)
            .bind(id)
            .bind_raw(patch)
            .run()
            .await?;
        Ok(affected > 0)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let affected = self
            .client
            .query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .run()
            .await?;
        Ok(affected > 0)
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.client
            .query("DELETE FROM documents WHERE collection = $1 AND id = ANY($2::text[])")
            .bind(collection)
            .bind(ids)
            .run()
            .await
    }

    async fn delete_where(
        &self,
        collection: &str,
        path: &str,
        value: &str,
    ) -> Result<Vec<String>, AppError> {
        let rows = self
            .client
            .query(
                "DELETE FROM documents
                 WHERE collection = $1 AND body #>> $2::text[] = $3
                 RETURNING id",
            )
            .bind(collection)
            .bind(field_path(path))
            .bind(value)
            .fetch_all()
            .await?;
        rows.iter().map(|r| r.get::<String>("id")).collect()
    }

    async fn exists(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let row = self
            .client
            .query("SELECT 1 AS found FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_one()
            .await?;
        Ok(row.is_some())
    }

    async fn push_to_array(
        &self,
        collection: &str,
        ids: &[String],
        field: &str,
        value: JsonValue,
    ) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.client
            .query(
                "UPDATE documents
                 SET body = jsonb_set(
                         body,
                         $3::text[],
                         COALESCE(body #> $3::text[], '[]'::jsonb) || jsonb_build_array($4::jsonb),
                         true),
                     updated_at = NOW()
                 WHERE collection = $1 AND id = ANY($2::text[])",
            )
            .bind(collection)
            .bind(ids)
            .bind(field_path(field))
            .bind_raw(value)
            .run()
            .await
    }

    async fn pull_from_array(
        &self,
        collection: &str,
        field: &str,
        value: JsonValue,
    ) -> Result<u64, AppError> {
        self.client
            .query(
                "UPDATE documents
                 SET body = jsonb_set(
                         body,
                         $2::text[],
                         COALESCE(
                             (SELECT jsonb_agg(e) FROM jsonb_array_elements(body #> $2::text[]) e
                              WHERE e <> $3::jsonb),
                             '[]'::jsonb)),
                     updated_at = NOW()
                 WHERE collection = $1 AND body #> $2::text[] @> jsonb_build_array($3::jsonb)",
            )
            .bind(collection)
            .bind(field_path(field))
            .bind_raw(value)
            .run()
            .await
    }

    async fn list_ids(&self, collection: &str) -> Result<Vec<String>, AppError> {
        let rows = self
            .client
            .query("SELECT id FROM documents WHERE collection = $1 ORDER BY id")
            .bind(collection)
            .fetch_all()
            .await?;
        rows.iter().map(|r| r.get::<String>("id")).collect()
    }
}

//! Document table keyed by collection and ID.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::db::SqlExecutor;
use crate::error::AppError;
use crate::schema::SchemaStep;

pub struct M001Documents;

impl SchemaStep for M001Documents {
    fn id(&self) -> &'static str {
        "target001_documents"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "JSONB documents table"
    }

    fn up<'a>(&'a self, ctx: &'a (dyn SqlExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            ctx.execute_sql(
                r#"
                CREATE TABLE IF NOT EXISTS documents (
                    collection TEXT NOT NULL,
                    id TEXT NOT NULL,
                    body JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (collection, id)
                );

                CREATE INDEX IF NOT EXISTS documents_body_idx
                ON documents USING GIN (body jsonb_path_ops);
                "#,
            )
            .await
        }
        .boxed()
    }
}

//! Expression indexes for the field lookups run during migration.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::db::SqlExecutor;
use crate::error::AppError;
use crate::schema::SchemaStep;

pub struct M002LookupIndexes;

impl SchemaStep for M002LookupIndexes {
    fn id(&self) -> &'static str {
        "target002_lookup_indexes"
    }

    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Indexes for user email, category number and media owner lookups"
    }

    fn up<'a>(&'a self, ctx: &'a (dyn SqlExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            ctx.execute_sql(
                r#"
                CREATE INDEX IF NOT EXISTS documents_users_email_idx
                ON documents ((body->>'email')) WHERE collection = 'users';

                CREATE INDEX IF NOT EXISTS documents_categories_number_idx
                ON documents ((body->>'number')) WHERE collection = 'categories';

                CREATE INDEX IF NOT EXISTS documents_media_owner_idx
                ON documents ((body->'linkedTo'->>'reference')) WHERE collection = 'media';
                "#,
            )
            .await
        }
        .boxed()
    }
}

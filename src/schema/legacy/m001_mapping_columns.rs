//! Mapping columns on every migrated legacy table.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::db::SqlExecutor;
use crate::error::AppError;
use crate::models::{EntityKind, MAPPING_COLUMN, MEDIA_IDS_COLUMN};
use crate::schema::SchemaStep;

pub struct M001MappingColumns;

impl M001MappingColumns {
    fn statements() -> Vec<String> {
        let mut statements = Vec::new();
        for kind in EntityKind::all() {
            let table = kind.legacy_table().table;
            statements.push(format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} TEXT NOT NULL DEFAULT ''",
                table, MAPPING_COLUMN
            ));
            if kind.tracks_media() {
                statements.push(format!(
                    "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} TEXT NOT NULL DEFAULT ''",
                    table, MEDIA_IDS_COLUMN
                ));
            }
        }
        statements
    }
}

impl SchemaStep for M001MappingColumns {
    fn id(&self) -> &'static str {
        "legacy001_mapping_columns"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "mapped_id and media_ids columns on legacy tables"
    }

    fn up<'a>(&'a self, ctx: &'a (dyn SqlExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            for statement in Self::statements() {
                ctx.execute_sql(&statement).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_posts_get_media_column() {
        let statements = M001MappingColumns::statements();
        assert_eq!(statements.len(), EntityKind::all().len() + 1);

        let media: Vec<_> = statements
            .iter()
            .filter(|s| s.contains(MEDIA_IDS_COLUMN))
            .collect();
        assert_eq!(media.len(), 1);
        assert!(media[0].starts_with("ALTER TABLE posts "));
    }
}

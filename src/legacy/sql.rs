//! Legacy source over any [`SqlExecutor`].
//!
//! Table and column names come from the static [`EntityKind`] descriptors;
//! every value is bound as a parameter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::{QueryExt, Row, SqlExecutor};
use crate::error::AppError;
use crate::legacy::{IdRange, LegacySource, MappingColumns};
use crate::models::{EntityKind, MAPPING_COLUMN, MEDIA_IDS_COLUMN};

pub struct SqlLegacySource<E> {
    executor: E,
}

impl<E: SqlExecutor> SqlLegacySource<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    fn list_sql(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::User => {
                "SELECT user_id AS id FROM users
                 WHERE user_role > 0 AND user_id BETWEEN $1::bigint AND $2::bigint
                 ORDER BY user_id ASC"
            }
            EntityKind::Article => {
                "SELECT post_id AS id FROM posts
                 WHERE post_type = 1 AND post_publish_status = 0
                   AND post_id BETWEEN $1::bigint AND $2::bigint
                 ORDER BY post_id DESC"
            }
            EntityKind::Company => {
                "SELECT c.company_id AS id FROM companies c
                 WHERE c.company_id BETWEEN $1::bigint AND $2::bigint
                   AND EXISTS (SELECT 1 FROM live l WHERE l.company_id = c.company_id)
                 ORDER BY c.company_id ASC"
            }
            EntityKind::Issue => {
                "SELECT issue_id AS id FROM issues
                 WHERE issue_id BETWEEN $1::bigint AND $2::bigint
                 ORDER BY issue_id ASC"
            }
            EntityKind::Tag => {
                "SELECT post_tag_id AS id FROM post_tag
                 WHERE post_tag_id BETWEEN $1::bigint AND $2::bigint
                 ORDER BY post_tag_id ASC"
            }
            EntityKind::AdminTag => {
                "SELECT admin_label_id AS id FROM admin_labels
                 WHERE admin_label_id BETWEEN $1::bigint AND $2::bigint
                 ORDER BY admin_label_id ASC"
            }
            EntityKind::LiveRecord => {
                "SELECT l.live_id AS id FROM live l
                 JOIN companies c ON l.company_id = c.company_id
                 WHERE l.live_id BETWEEN $1::bigint AND $2::bigint
                 ORDER BY l.live_id ASC"
            }
        }
    }

    fn record_sql(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::User => "SELECT * FROM users WHERE user_id = $1::bigint",
            EntityKind::Article => "SELECT * FROM posts WHERE post_id = $1::bigint",
            EntityKind::Company => "SELECT * FROM companies WHERE company_id = $1::bigint",
            EntityKind::Issue => "SELECT * FROM issues WHERE issue_id = $1::bigint",
            EntityKind::Tag => {
                "SELECT post_tag_id AS tag_id, post_tag_text AS tag_text, mapped_id
                 FROM post_tag WHERE post_tag_id = $1::bigint"
            }
            EntityKind::AdminTag => {
                "SELECT admin_label_id AS tag_id, admin_label_text AS tag_text, mapped_id
                 FROM admin_labels WHERE admin_label_id = $1::bigint"
            }
            EntityKind::LiveRecord => {
                "SELECT l.*, c.mapped_id AS company_mapped_id FROM live l
                 JOIN companies c ON l.company_id = c.company_id
                 WHERE l.live_id = $1::bigint"
            }
        }
    }

    async fn mapped_column(&self, sql: &str, post_id: i64) -> Result<Vec<String>, AppError> {
        let rows = self.executor.query(sql).bind(post_id).fetch_all().await?;
        Ok(rows.iter().map(|r| r.text(MAPPING_COLUMN)).collect())
    }
}

#[async_trait]
impl<E: SqlExecutor> LegacySource for SqlLegacySource<E> {
    async fn list_ids(&self, kind: EntityKind, range: IdRange) -> Result<Vec<i64>, AppError> {
        let rows = self
            .executor
            .query(Self::list_sql(kind))
            .bind(range.lower())
            .bind(range.upper())
            .fetch_all()
            .await?;
        Ok(rows.iter().filter_map(|r| r.int("id")).collect())
    }

    async fn fetch_record(&self, kind: EntityKind, legacy_id: i64) -> Result<Option<Row>, AppError> {
        self.executor
            .query(Self::record_sql(kind))
            .bind(legacy_id)
            .fetch_one()
            .await
    }

    async fn article_author_ids(&self, post_id: i64) -> Result<Vec<String>, AppError> {
        self.mapped_column(
            "SELECT u.mapped_id FROM post_author_map m
             JOIN users u ON m.user_id = u.user_id
             WHERE m.post_id = $1::bigint",
            post_id,
        )
        .await
    }

    async fn article_category_numbers(&self, post_id: i64) -> Result<Vec<i64>, AppError> {
        let rows = self
            .executor
            .query(
                "SELECT pc.m_number FROM post_category_map m
                 JOIN post_categories pc ON m.post_category_id = pc.post_category_id
                 WHERE m.post_id = $1::bigint AND pc.m_number > 0",
            )
            .bind(post_id)
            .fetch_all()
            .await?;
        Ok(rows.iter().filter_map(|r| r.int("m_number")).collect())
    }

    async fn article_tag_ids(&self, kind: EntityKind, post_id: i64) -> Result<Vec<String>, AppError> {
        let sql = match kind {
            EntityKind::Tag => {
                "SELECT t.mapped_id FROM post_tag_map m
                 JOIN post_tag t ON m.post_tag_id = t.post_tag_id
                 WHERE m.post_id = $1::bigint"
            }
            EntityKind::AdminTag => {
                "SELECT a.mapped_id FROM post_admin_labels_map m
                 JOIN admin_labels a ON m.admin_label_id = a.admin_label_id
                 WHERE m.post_id = $1::bigint"
            }
            other => {
                return Err(AppError::Internal(format!(
                    "{} is not a tag kind",
                    other.as_str()
                )))
            }
        };
        self.mapped_column(sql, post_id).await
    }

    async fn article_editor_ids(
        &self,
        post_id: i64,
    ) -> Result<(Option<String>, Option<String>), AppError> {
        let row = self
            .executor
            .query(
                "SELECT c.mapped_id AS created_by, m.mapped_id AS modified_by FROM posts p
                 LEFT JOIN users c ON p.post_created_by = c.user_id
                 LEFT JOIN users m ON p.post_modified_by = m.user_id
                 WHERE p.post_id = $1::bigint",
            )
            .bind(post_id)
            .fetch_one()
            .await?;

        let pick = |column: &str| {
            row.as_ref()
                .map(|r| r.text(column))
                .filter(|s| !s.trim().is_empty())
        };
        Ok((pick("created_by"), pick("modified_by")))
    }

    async fn issue_article_ids(
        &self,
        post_ids: &[i64],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        let rows = self
            .executor
            .query(
                "SELECT mapped_id FROM posts
                 WHERE (post_id = ANY($1::bigint[])
                        OR post_publish_date::date BETWEEN $2::text::date AND $3::text::date)
                   AND mapped_id <> ''
                 ORDER BY post_id ASC",
            )
            .bind(post_ids)
            .bind(start.format("%Y-%m-%d").to_string())
            .bind(end.format("%Y-%m-%d").to_string())
            .fetch_all()
            .await?;
        Ok(rows.iter().map(|r| r.text(MAPPING_COLUMN)).collect())
    }

    async fn post_mapped_ids(&self, post_ids: &[i64]) -> Result<Vec<String>, AppError> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = self
            .executor
            .query("SELECT post_id, mapped_id FROM posts WHERE post_id = ANY($1::bigint[])")
            .bind(post_ids)
            .fetch_all()
            .await?;

        let by_post: HashMap<i64, String> = rows
            .iter()
            .filter_map(|r| Some((r.int("post_id")?, r.text(MAPPING_COLUMN))))
            .collect();

        Ok(post_ids
            .iter()
            .filter_map(|id| by_post.get(id))
            .filter(|m| !m.is_empty())
            .cloned()
            .collect())
    }

    async fn read_mapping(
        &self,
        kind: EntityKind,
        legacy_id: i64,
    ) -> Result<Option<MappingColumns>, AppError> {
        let table = kind.legacy_table();
        let sql = if kind.tracks_media() {
            format!(
                "SELECT {}, {} FROM {} WHERE {} = $1::bigint",
                MAPPING_COLUMN, MEDIA_IDS_COLUMN, table.table, table.key
            )
        } else {
            format!(
                "SELECT {} FROM {} WHERE {} = $1::bigint",
                MAPPING_COLUMN, table.table, table.key
            )
        };

        let row = self.executor.query(&sql).bind(legacy_id).fetch_one().await?;
        Ok(row.map(|r| MappingColumns {
            mapped_id: r.text(MAPPING_COLUMN),
            media_ids: kind.tracks_media().then(|| r.text(MEDIA_IDS_COLUMN)),
        }))
    }

    async fn mapped_legacy_ids(&self, kind: EntityKind, mapped_id: &str) -> Result<Vec<i64>, AppError> {
        let table = kind.legacy_table();
        let sql = format!(
            "SELECT {key} AS id FROM {} WHERE {} = $1 ORDER BY {key} ASC",
            table.table,
            MAPPING_COLUMN,
            key = table.key
        );
        let rows = self.executor.query(&sql).bind(mapped_id).fetch_all().await?;
        Ok(rows.iter().filter_map(|r| r.int("id")).collect())
    }

    async fn write_mapping(
        &self,
        kind: EntityKind,
        legacy_id: i64,
        columns: &MappingColumns,
    ) -> Result<u64, AppError> {
        let table = kind.legacy_table();
        match (&columns.media_ids, kind.tracks_media()) {
            (Some(media_ids), true) => {
                let sql = format!(
                    "UPDATE {} SET {} = $2, {} = $3 WHERE {} = $1::bigint",
                    table.table, MAPPING_COLUMN, MEDIA_IDS_COLUMN, table.key
                );
                self.executor
                    .query(&sql)
                    .bind(legacy_id)
                    .bind(&columns.mapped_id)
                    .bind(media_ids)
                    .run()
                    .await
            }
            _ => {
                let sql = format!(
                    "UPDATE {} SET {} = $2 WHERE {} = $1::bigint",
                    table.table, MAPPING_COLUMN, table.key
                );
                self.executor
                    .query(&sql)
                    .bind(legacy_id)
                    .bind(&columns.mapped_id)
                    .run()
                    .await
            }
        }
    }

    async fn clear_all_mappings(&self, kind: EntityKind) -> Result<u64, AppError> {
        let table = kind.legacy_table();
        let sql = if kind.tracks_media() {
            format!(
                "UPDATE {} SET {} = '', {} = ''",
                table.table, MAPPING_COLUMN, MEDIA_IDS_COLUMN
            )
        } else {
            format!("UPDATE {} SET {} = ''", table.table, MAPPING_COLUMN)
        };
        self.executor.query(&sql).run().await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.executor.query("SELECT 1 AS ok").fetch_one().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Params, RowStream};
    use serde_json::{json, Value as JsonValue};
    use std::sync::Mutex;

    /// Records every statement and answers queries with canned rows.
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(String, Params)>>,
        rows: Vec<Row>,
    }

    impl RecordingExecutor {
        fn with_rows(rows: Vec<Row>) -> Self {
            Self {
                calls: Mutex::new(vec![]),
                rows,
            }
        }

        fn calls(&self) -> Vec<(String, Params)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SqlExecutor for RecordingExecutor {
        async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
            self.calls.lock().unwrap().push((sql.to_string(), vec![]));
            Ok(())
        }

        async fn query_sql(&self, sql: &str, params: Params) -> Result<RowStream<'_>, AppError> {
            self.calls.lock().unwrap().push((sql.to_string(), params));
            let rows: Vec<Result<Row, AppError>> = self.rows.iter().cloned().map(Ok).collect();
            Ok(Box::pin(futures::stream::iter(rows)))
        }

        async fn run_sql(&self, sql: &str, params: Params) -> Result<u64, AppError> {
            self.calls.lock().unwrap().push((sql.to_string(), params));
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_list_ids_binds_open_range() {
        let source = SqlLegacySource::new(RecordingExecutor::with_rows(vec![
            Row::from([("id", json!(9))]),
            Row::from([("id", json!(4))]),
        ]));

        let ids = source
            .list_ids(EntityKind::Article, IdRange::all())
            .await
            .unwrap();
        assert_eq!(ids, vec![9, 4]);

        let calls = source.executor.calls();
        assert!(calls[0].0.contains("ORDER BY post_id DESC"));
        assert_eq!(calls[0].1, vec![json!(0), json!(i64::MAX)]);
    }

    #[tokio::test]
    async fn test_issue_range_is_ascending_and_inclusive() {
        let source = SqlLegacySource::new(RecordingExecutor::default());
        source
            .list_ids(EntityKind::Issue, IdRange::between(3, 7))
            .await
            .unwrap();

        let (sql, params) = &source.executor.calls()[0];
        assert!(sql.contains("issue_id BETWEEN $1::bigint AND $2::bigint"));
        assert_eq!(params, &vec![json!(3), json!(7)]);
    }

    #[tokio::test]
    async fn test_write_mapping_includes_media_only_for_articles() {
        let source = SqlLegacySource::new(RecordingExecutor::default());
        let columns = MappingColumns {
            mapped_id: "new".into(),
            media_ids: Some("m1,m2".into()),
        };

        source
            .write_mapping(EntityKind::Article, 1, &columns)
            .await
            .unwrap();
        source
            .write_mapping(EntityKind::User, 2, &columns)
            .await
            .unwrap();

        let calls = source.executor.calls();
        assert_eq!(
            calls[0].0,
            "UPDATE posts SET mapped_id = $2, media_ids = $3 WHERE post_id = $1::bigint"
        );
        assert_eq!(calls[0].1, vec![json!(1), json!("new"), json!("m1,m2")]);
        assert_eq!(
            calls[1].0,
            "UPDATE users SET mapped_id = $2 WHERE user_id = $1::bigint"
        );
    }

    #[tokio::test]
    async fn test_post_mapped_ids_keep_list_order() {
        let source = SqlLegacySource::new(RecordingExecutor::with_rows(vec![
            Row::from([("post_id", json!(2)), ("mapped_id", json!("b"))]),
            Row::from([("post_id", json!(1)), ("mapped_id", json!("a"))]),
            Row::from([("post_id", json!(3)), ("mapped_id", json!(""))]),
        ]));

        let ids = source.post_mapped_ids(&[1, 3, 2]).await.unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_editor_ids_blank_is_none() {
        let source = SqlLegacySource::new(RecordingExecutor::with_rows(vec![Row::from([
            ("created_by", json!("u1")),
            ("modified_by", JsonValue::Null),
        ])]));

        let (created, modified) = source.article_editor_ids(1).await.unwrap();
        assert_eq!(created.as_deref(), Some("u1"));
        assert_eq!(modified, None);
    }
}

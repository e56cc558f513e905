//! Article migration.
//!
//! Articles depend on users, tags, admin labels and categories having been
//! migrated already. Their body comes from the content API and runs through
//! the [`ContentTransducer`]; every media record produced along the way is
//! written onto the legacy row next to the mapping so a later clean can
//! find it again.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::content::{ContentTransducer, TransducedContent};
use crate::context::{AppContentApi, AppLegacy, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::legacy::LegacyArticle;
use crate::media::{MediaCleanup, MediaPipeline};
use crate::migrators::past::{check_past, clear_stale, fetch_record, Discard};
use crate::migrators::tables::{article_approval_status, article_publish_status};
use crate::migrators::{CleanReport, EntityMigrator, MigrationReport, MigrationStage};
use crate::models::{
    generate_id, Article, ArticleAuthor, ArticleCategory, ArticleTag, CoverMedia, Document,
    EngagementCount, EntityKind, MediaRole, StoreSlot, Tag, User,
};
use crate::repositories::{CategoryRepository, DocumentRepository, IdMapper};

/// Cover crops and content images go to the primary archive.
const MEDIA_SLOT: StoreSlot = StoreSlot::ArchiveA;

#[derive(FromContext, Clone)]
pub struct ArticleMigrator {
    legacy: AppLegacy,
    mapper: IdMapper,
    documents: DocumentRepository,
    categories: CategoryRepository,
    media: MediaPipeline,
    transducer: ContentTransducer,
    content_api: AppContentApi,
    config: Arc<Config>,
}

/// Cross-references resolved in FETCH_DEPENDENCIES.
#[derive(Debug, Clone, Default)]
pub struct ArticleRelations {
    pub users: Vec<ArticleAuthor>,
    pub categories: Vec<ArticleCategory>,
    pub tags: Vec<ArticleTag>,
    pub created_by: String,
    pub updated_by: String,
}

/// Builds the article without its cover.
pub fn article_document(
    id: String,
    legacy: &LegacyArticle,
    relations: ArticleRelations,
    content: &TransducedContent,
) -> Article {
    Article {
        id,
        article_type: 0,
        title: legacy.title.trim().to_string(),
        inshort: legacy.excerpt.trim().to_string(),
        old_article_id: legacy.post_id,
        users: relations.users,
        categories: relations.categories,
        tags: relations.tags,
        cover_media: None,
        approval_status: article_approval_status(legacy.publish_status),
        publish_status: article_publish_status(legacy.publish_status),
        is_institute_restricted: legacy.restrict_to_lan,
        content: content.blocks.clone(),
        engagement_count: EngagementCount {
            hits: legacy.hits,
            comments: legacy.comment_count,
        },
        read_time: content.read_time_seconds,
        time_spent: content.read_time_seconds,
        created_at: legacy.created,
        updated_at: legacy.modified,
        created_by: relations.created_by,
        updated_by: relations.updated_by,
    }
}

/// Drops unmigrated (blank) references, logging each one.
fn migrated_only(kind: EntityKind, ids: Vec<String>) -> Vec<String> {
    ids.into_iter()
        .filter(|id| {
            let blank = id.trim().is_empty();
            if blank {
                tracing::warn!(kind = %kind, "Skipping unmigrated reference");
            }
            !blank
        })
        .map(|id| id.trim().to_string())
        .collect()
}

impl ArticleMigrator {
    async fn resolve_authors(&self, ids: Vec<String>) -> Result<Vec<ArticleAuthor>, AppError> {
        let ids = migrated_only(EntityKind::User, ids);
        let found: HashMap<String, User> = self
            .documents
            .find_many::<User>(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        ids.into_iter()
            .map(|id| match found.get(&id) {
                Some(user) => Ok(ArticleAuthor {
                    name: user.full_name.clone(),
                    team: 0,
                    details: id,
                }),
                None => Err(AppError::dependency(EntityKind::User, id)),
            })
            .collect()
    }

    async fn resolve_tags(
        &self,
        kind: EntityKind,
        ids: Vec<String>,
    ) -> Result<Vec<ArticleTag>, AppError> {
        let ids = migrated_only(kind, ids);
        let found: HashMap<String, Tag> = self
            .documents
            .find_many::<Tag>(&ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        ids.into_iter()
            .map(|id| match found.get(&id) {
                Some(tag) => Ok(ArticleTag {
                    name: tag.name.clone(),
                    is_admin: tag.is_admin,
                    reference: id,
                }),
                None => Err(AppError::dependency(kind, id)),
            })
            .collect()
    }

    async fn fetch_relations(&self, post_id: i64) -> Result<ArticleRelations, AppError> {
        let (author_ids, leaves, tag_ids, label_ids, (created_by, updated_by)) = tokio::try_join!(
            self.legacy.article_author_ids(post_id),
            self.legacy.article_category_numbers(post_id),
            self.legacy.article_tag_ids(EntityKind::Tag, post_id),
            self.legacy.article_tag_ids(EntityKind::AdminTag, post_id),
            self.legacy.article_editor_ids(post_id),
        )?;

        let (users, categories, mut tags, labels) = tokio::try_join!(
            self.resolve_authors(author_ids),
            self.categories.resolve(&leaves),
            self.resolve_tags(EntityKind::Tag, tag_ids),
            self.resolve_tags(EntityKind::AdminTag, label_ids),
        )?;
        tags.extend(labels);

        let default_author = &self.config.media.default_author_id;
        Ok(ArticleRelations {
            users,
            categories,
            tags,
            created_by: created_by.unwrap_or_else(|| default_author.clone()),
            updated_by: updated_by.unwrap_or_else(|| default_author.clone()),
        })
    }

    /// Migrates both cover crops. A failed crop is logged and left out.
    async fn migrate_cover(
        &self,
        article_id: &str,
        featured: &str,
    ) -> (Option<CoverMedia>, Vec<String>) {
        let base = format!(
            "{}/post/{}",
            self.config.media.archive_source.trim_end_matches('/'),
            featured
        );

        let mut crops = Vec::with_capacity(2);
        for (role, transform) in [
            (MediaRole::CoverSquare, "n-square"),
            (MediaRole::CoverRectangle, "n-rectangle"),
        ] {
            let url = format!("{}?tr={}", base, transform);
            match self
                .media
                .migrate(&url, EntityKind::Article, article_id, role, MEDIA_SLOT)
                .await
            {
                Ok(asset) => crops.push(asset.id),
                Err(e) => {
                    tracing::warn!(url = %url, code = e.code(), error = %e, "Skipping cover crop")
                }
            }
        }

        let cover = match crops.as_slice() {
            [square, rectangle] => Some(CoverMedia {
                square: square.clone(),
                rectangle: rectangle.clone(),
            }),
            _ => None,
        };
        (cover, crops)
    }

    fn discard(&self) -> Discard<'_> {
        Discard {
            mapper: &self.mapper,
            documents: &self.documents,
            media: &self.media,
            kind: EntityKind::Article,
            slot: MEDIA_SLOT,
        }
    }

    /// Deletes media still recorded on a row whose article is gone.
    async fn drop_recorded_media(&self, legacy_id: i64) -> Result<MediaCleanup, AppError> {
        let recorded = self.mapper.lookup_media(legacy_id).await?;
        Ok(self.media.delete_many_by_name(&recorded, MEDIA_SLOT).await)
    }

    /// PERSIST and REMAP. Returns every media ID produced for the article.
    async fn persist(
        &self,
        legacy_id: i64,
        article: &Article,
        featured: Option<&str>,
        content_media: &[String],
    ) -> Result<Vec<String>, AppError> {
        self.documents.create(article).await?;

        let mut media_ids = vec![];
        if let Some(featured) = featured {
            let (cover, cover_ids) = self.migrate_cover(&article.id, featured).await;
            if let Some(cover) = cover {
                self.documents
                    .update::<Article>(&article.id, json!({ "coverMedia": cover }))
                    .await?;
            }
            media_ids.extend(cover_ids);
        }
        media_ids.extend(content_media.iter().cloned());

        MigrationStage::Remap.enter();
        self.mapper
            .set_with_media(legacy_id, &article.id, &media_ids)
            .await?;
        let authors = article.author_ids();
        let credited = self
            .documents
            .push_contribution(&authors, EntityKind::Article.model_name(), &article.id)
            .await?;
        tracing::debug!(authors = authors.len(), credited, "Recorded contributions");

        Ok(media_ids)
    }

    /// Removes the article, its media and its author back-references.
    async fn clean_target(&self, legacy_id: i64, article_id: &str) -> Result<MediaCleanup, AppError> {
        MigrationStage::CleanPast.enter();
        let recorded = self.mapper.lookup_media(legacy_id).await?;
        let by_name = self.media.delete_many_by_name(&recorded, MEDIA_SLOT).await;
        let linked = self.media.delete_for_owner(article_id, MEDIA_SLOT).await;

        self.documents
            .pull_contribution(EntityKind::Article.model_name(), article_id)
            .await?;
        self.documents
            .delete_in(Article::COLLECTION, article_id)
            .await?;
        self.mapper.clear(EntityKind::Article, legacy_id).await?;

        Ok(MediaCleanup {
            remote_files: by_name.remote_files + linked.remote_files,
            records: by_name.records + linked.records,
        })
    }
}

#[async_trait]
impl EntityMigrator for ArticleMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Article
    }

    async fn migrate_single(&self, legacy_id: i64) -> Result<MigrationReport, AppError> {
        let row = fetch_record(self.legacy.as_ref(), EntityKind::Article, legacy_id).await?;
        let legacy = LegacyArticle::from_row(&row)?;

        let replaced =
            check_past(&self.mapper, &self.documents, EntityKind::Article, legacy_id).await?;
        match &replaced {
            Some(old) => {
                self.clean_target(legacy_id, old).await?;
            }
            None => {
                self.drop_recorded_media(legacy_id).await?;
            }
        }

        MigrationStage::FetchDependencies.enter();
        let (relations, body) = tokio::try_join!(
            self.fetch_relations(legacy_id),
            self.content_api.fetch_article_body(legacy_id),
        )?;

        MigrationStage::Transduce.enter();
        let id = generate_id();
        let content = self.transducer.transduce(&body.content, &id).await?;
        let article = article_document(id, &legacy, relations, &content);

        MigrationStage::Persist.enter();
        let media_ids = match self
            .persist(legacy_id, &article, body.featured_image.as_deref(), &content.media_ids)
            .await
        {
            Ok(media_ids) => media_ids,
            Err(err) => {
                // Content images were uploaded during TRANSDUCE and are linked
                // to the article, so discarding it removes them too.
                self.discard().run(legacy_id, &article.id, &err).await;
                if let Err(e) = self
                    .documents
                    .pull_contribution(EntityKind::Article.model_name(), &article.id)
                    .await
                {
                    tracing::warn!(code = e.code(), error = %e, "Could not withdraw contributions");
                }
                return Err(err);
            }
        };

        Ok(MigrationReport {
            kind: EntityKind::Article,
            legacy_id,
            new_id: article.id,
            replaced,
            media_ids,
        })
    }

    async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError> {
        match check_past(&self.mapper, &self.documents, EntityKind::Article, legacy_id).await? {
            Some(article_id) => {
                self.clean_target(legacy_id, &article_id).await?;
                Ok(Some(article_id))
            }
            None => {
                self.drop_recorded_media(legacy_id).await?;
                clear_stale(&self.mapper, EntityKind::Article, legacy_id).await?;
                Ok(None)
            }
        }
    }

    async fn clean_all(&self) -> Result<CleanReport, AppError> {
        let ids = self.documents.list_ids(Article::COLLECTION).await?;
        for id in &ids {
            self.documents
                .pull_contribution(EntityKind::Article.model_name(), id)
                .await?;
        }

        let media = self
            .media
            .delete_by_owner_kind(EntityKind::Article, MEDIA_SLOT)
            .await;
        let documents = self.documents.delete_many::<Article>(&ids).await?;
        let mappings = self.mapper.clear_all(EntityKind::Article).await?;

        Ok(CleanReport {
            kind: EntityKind::Article,
            documents,
            mappings,
            media,
        })
    }
}

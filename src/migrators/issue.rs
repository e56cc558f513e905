use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::context::{AppLegacy, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::legacy::LegacyIssue;
use crate::media::MediaPipeline;
use crate::migrators::past::{check_past, clear_stale, fetch_record, Discard};
use crate::migrators::{CleanReport, EntityMigrator, MigrationReport, MigrationStage};
use crate::models::{generate_id, Document, EntityKind, Issue, MediaRole, StoreSlot};
use crate::repositories::{DocumentRepository, IdMapper};

/// Number of listed posts that become the featured articles.
pub const FEATURED_COUNT: usize = 5;

const COVER_SLOT: StoreSlot = StoreSlot::ArchiveA;

#[derive(FromContext, Clone)]
pub struct IssueMigrator {
    legacy: AppLegacy,
    mapper: IdMapper,
    documents: DocumentRepository,
    media: MediaPipeline,
    config: Arc<Config>,
}

pub fn issue_document(
    id: String,
    legacy: &LegacyIssue,
    articles: Vec<String>,
    featured: Vec<String>,
) -> Issue {
    Issue {
        id,
        name: legacy.name.trim().to_string(),
        thumbnail: None,
        is_published: true,
        start_date: legacy.start_date,
        end_date: legacy.end_date,
        articles,
        featured,
    }
}

impl IssueMigrator {
    fn discard(&self) -> Discard<'_> {
        Discard {
            mapper: &self.mapper,
            documents: &self.documents,
            media: &self.media,
            kind: EntityKind::Issue,
            slot: COVER_SLOT,
        }
    }

    /// PERSIST and REMAP. Returns the produced media IDs.
    async fn persist(
        &self,
        legacy_id: i64,
        issue: &Issue,
        legacy: &LegacyIssue,
    ) -> Result<Vec<String>, AppError> {
        self.documents.create(issue).await?;

        let mut media_ids = vec![];
        if let Some(file) = &legacy.thumbnail {
            let url = format!(
                "{}/issue/{}",
                self.config.media.archive_source.trim_end_matches('/'),
                file
            );
            match self
                .media
                .migrate(&url, EntityKind::Issue, &issue.id, MediaRole::IssueCover, COVER_SLOT)
                .await
            {
                Ok(asset) => {
                    self.documents
                        .update::<Issue>(&issue.id, json!({ "thumbnail": asset.image_ref() }))
                        .await?;
                    media_ids.push(asset.id);
                }
                Err(e) => tracing::warn!(url = %url, code = e.code(), error = %e, "Skipping issue cover"),
            }
        }

        MigrationStage::Remap.enter();
        self.mapper.set(EntityKind::Issue, legacy_id, &issue.id).await?;
        Ok(media_ids)
    }

    async fn clean_target(&self, legacy_id: i64, issue_id: &str) -> Result<(), AppError> {
        MigrationStage::CleanPast.enter();
        self.media.delete_for_owner(issue_id, COVER_SLOT).await;
        self.documents.delete_in(Issue::COLLECTION, issue_id).await?;
        self.mapper.clear(EntityKind::Issue, legacy_id).await
    }
}

#[async_trait]
impl EntityMigrator for IssueMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Issue
    }

    async fn migrate_single(&self, legacy_id: i64) -> Result<MigrationReport, AppError> {
        let row = fetch_record(self.legacy.as_ref(), EntityKind::Issue, legacy_id).await?;
        let legacy = LegacyIssue::from_row(&row)?;

        let replaced = check_past(&self.mapper, &self.documents, EntityKind::Issue, legacy_id).await?;
        if let Some(old) = &replaced {
            self.clean_target(legacy_id, old).await?;
        }

        MigrationStage::FetchDependencies.enter();
        let featured_posts = &legacy.listed_posts[..legacy.listed_posts.len().min(FEATURED_COUNT)];
        let (articles, featured) = tokio::try_join!(
            self.legacy
                .issue_article_ids(&legacy.listed_posts, legacy.start_date, legacy.end_date),
            self.legacy.post_mapped_ids(featured_posts),
        )?;
        tracing::debug!(articles = articles.len(), featured = featured.len(), "Resolved issue articles");

        MigrationStage::Transduce.enter();
        let issue = issue_document(generate_id(), &legacy, articles, featured);

        MigrationStage::Persist.enter();
        let media_ids = match self.persist(legacy_id, &issue, &legacy).await {
            Ok(media_ids) => media_ids,
            Err(err) => {
                self.discard().run(legacy_id, &issue.id, &err).await;
                return Err(err);
            }
        };

        Ok(MigrationReport {
            kind: EntityKind::Issue,
            legacy_id,
            new_id: issue.id,
            replaced,
            media_ids,
        })
    }

    async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError> {
        match check_past(&self.mapper, &self.documents, EntityKind::Issue, legacy_id).await? {
            Some(issue_id) => {
                self.clean_target(legacy_id, &issue_id).await?;
                Ok(Some(issue_id))
            }
            None => {
                clear_stale(&self.mapper, EntityKind::Issue, legacy_id).await?;
                Ok(None)
            }
        }
    }

    async fn clean_all(&self) -> Result<CleanReport, AppError> {
        let media = self
            .media
            .delete_by_owner_kind(EntityKind::Issue, COVER_SLOT)
            .await;
        let ids = self.documents.list_ids(Issue::COLLECTION).await?;
        let documents = self.documents.delete_many::<Issue>(&ids).await?;
        let mappings = self.mapper.clear_all(EntityKind::Issue).await?;

        Ok(CleanReport {
            kind: EntityKind::Issue,
            documents,
            mappings,
            media,
        })
    }
}

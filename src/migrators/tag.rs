use async_trait::async_trait;

use crate::content::html;
use crate::context::{AppLegacy, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::legacy::LegacyTag;
use crate::migrators::past::{check_past, clear_stale, fetch_record, remap};
use crate::migrators::{CleanReport, EntityMigrator, MigrationReport, MigrationStage};
use crate::models::{generate_id, Document, EntityKind, Tag};
use crate::repositories::{DocumentRepository, IdMapper};
use crate::FromRef;

/// Post tags and admin labels. Both land in the `tags` collection.
#[derive(FromContext, Clone)]
pub struct TagMigrator {
    legacy: AppLegacy,
    mapper: IdMapper,
    documents: DocumentRepository,
    #[from_context(default)]
    admin: bool,
}

impl TagMigrator {
    /// Resolves the shared collaborators and picks the tag table.
    pub fn from_context(ctx: &Context, admin: bool) -> Self {
        Self {
            admin,
            ..Self::from_ref(ctx)
        }
    }

    fn admin_flag(&self) -> &'static str {
        if self.admin {
            "true"
        } else {
            "false"
        }
    }

    async fn clean_target(&self, legacy_id: i64, tag_id: &str) -> Result<(), AppError> {
        MigrationStage::CleanPast.enter();
        self.documents.delete_in(Tag::COLLECTION, tag_id).await?;
        self.mapper.clear(self.kind(), legacy_id).await
    }
}

/// Tag names are stored as markdown.
pub fn tag_document(id: String, legacy: &LegacyTag, is_admin: bool) -> Tag {
    Tag {
        id,
        name: html::to_markdown(legacy.text.trim()),
        is_admin,
        admin_color: Tag::DEFAULT_COLOR.to_string(),
    }
}


#[async_trait]
impl EntityMigrator for TagMigrator {
    fn kind(&self) -> EntityKind {
        if self.admin {
            EntityKind::AdminTag
        } else {
            EntityKind::Tag
        }
    }

    async fn migrate_single(&self, legacy_id: i64) -> Result<MigrationReport, AppError> {
        let kind = self.kind();
        let row = fetch_record(self.legacy.as_ref(), kind, legacy_id).await?;
        let legacy = LegacyTag::from_row(&row)?;

        let replaced = check_past(&self.mapper, &self.documents, kind, legacy_id).await?;
        if let Some(old) = &replaced {
            self.clean_target(legacy_id, old).await?;
        }

        MigrationStage::Transduce.enter();
        let tag = tag_document(generate_id(), &legacy, self.admin);

        MigrationStage::Persist.enter();
        self.documents.create(&tag).await?;

        remap(&self.mapper, &self.documents, kind, legacy_id, &tag.id).await?;

        Ok(MigrationReport {
            kind,
            legacy_id,
            new_id: tag.id,
            replaced,
            media_ids: vec![],
        })
    }

    async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError> {
        match check_past(&self.mapper, &self.documents, self.kind(), legacy_id).await? {
            Some(tag_id) => {
                self.clean_target(legacy_id, &tag_id).await?;
                Ok(Some(tag_id))
            }
            None => {
                clear_stale(&self.mapper, self.kind(), legacy_id).await?;
                Ok(None)
            }
        }
    }

    async fn clean_all(&self) -> Result<CleanReport, AppError> {
        let removed = self
            .documents
            .delete_where::<Tag>("isAdmin", self.admin_flag())
            .await?;
        let mappings = self.mapper.clear_all(self.kind()).await?;

        Ok(CleanReport {
            kind: self.kind(),
            documents: removed.len() as u64,
            mappings,
            media: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_document_markdown_name() {
        let legacy = LegacyTag {
            tag_id: 4,
            text: "  <strong>Fest</strong> &amp; Culture ".to_string(),
            mapped_id: String::new(),
        };
        let tag = tag_document("t1".to_string(), &legacy, true);
        assert_eq!(tag.name, "**Fest** & Culture");
        assert!(tag.is_admin);
        assert_eq!(tag.admin_color, "FFFFFF");
    }
}

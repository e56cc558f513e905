use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::context::{AppLegacy, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::legacy::LegacyCompany;
use crate::media::MediaPipeline;
use crate::migrators::past::{check_past, clear_stale, fetch_record, Discard};
use crate::migrators::tables::fix_extension;
use crate::migrators::{CleanReport, EntityMigrator, MigrationReport, MigrationStage};
use crate::models::{generate_id, Company, Document, EntityKind, MediaRole, StoreSlot};
use crate::repositories::{DocumentRepository, IdMapper};

const LOGO_SLOT: StoreSlot = StoreSlot::Active;

#[derive(FromContext, Clone)]
pub struct CompanyMigrator {
    legacy: AppLegacy,
    mapper: IdMapper,
    documents: DocumentRepository,
    media: MediaPipeline,
    config: Arc<Config>,
}

pub fn company_document(id: String, legacy: &LegacyCompany) -> Company {
    Company {
        id,
        name: legacy.name.trim().to_string(),
        alias: legacy.alias.iter().cloned().collect(),
        location: legacy.location.clone(),
        logo: None,
    }
}

impl CompanyMigrator {
    fn discard(&self) -> Discard<'_> {
        Discard {
            mapper: &self.mapper,
            documents: &self.documents,
            media: &self.media,
            kind: EntityKind::Company,
            slot: LOGO_SLOT,
        }
    }

    /// PERSIST and REMAP. Returns the produced media IDs.
    async fn persist(
        &self,
        legacy_id: i64,
        company: &Company,
        legacy: &LegacyCompany,
    ) -> Result<Vec<String>, AppError> {
        self.documents.create(company).await?;

        let mut media_ids = vec![];
        if let Some(avatar) = &legacy.avatar {
            let url = format!(
                "{}/company/{}",
                self.config.media.active_source.trim_end_matches('/'),
                fix_extension(avatar)
            );
            match self
                .media
                .migrate(&url, EntityKind::Company, &company.id, MediaRole::Logo, LOGO_SLOT)
                .await
            {
                Ok(asset) => {
                    self.documents
                        .update::<Company>(&company.id, json!({ "logo": asset.image_ref() }))
                        .await?;
                    media_ids.push(asset.id);
                }
                Err(e) => tracing::warn!(url = %url, code = e.code(), error = %e, "Skipping logo"),
            }
        }

        MigrationStage::Remap.enter();
        self.mapper
            .set(EntityKind::Company, legacy_id, &company.id)
            .await?;
        Ok(media_ids)
    }

    async fn clean_target(&self, legacy_id: i64, company_id: &str) -> Result<(), AppError> {
        MigrationStage::CleanPast.enter();
        self.media.delete_for_owner(company_id, LOGO_SLOT).await;
        self.documents.delete_in(Company::COLLECTION, company_id).await?;
        self.mapper.clear(EntityKind::Company, legacy_id).await
    }
}

#[async_trait]
impl EntityMigrator for CompanyMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Company
    }

    async fn migrate_single(&self, legacy_id: i64) -> Result<MigrationReport, AppError> {
        let row = fetch_record(self.legacy.as_ref(), EntityKind::Company, legacy_id).await?;
        let legacy = LegacyCompany::from_row(&row)?;

        let replaced =
            check_past(&self.mapper, &self.documents, EntityKind::Company, legacy_id).await?;
        if let Some(old) = &replaced {
            self.clean_target(legacy_id, old).await?;
        }

        MigrationStage::Transduce.enter();
        let company = company_document(generate_id(), &legacy);

        MigrationStage::Persist.enter();
        let media_ids = match self.persist(legacy_id, &company, &legacy).await {
            Ok(media_ids) => media_ids,
            Err(err) => {
                self.discard().run(legacy_id, &company.id, &err).await;
                return Err(err);
            }
        };

        Ok(MigrationReport {
            kind: EntityKind::Company,
            legacy_id,
            new_id: company.id,
            replaced,
            media_ids,
        })
    }

    async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError> {
        match check_past(&self.mapper, &self.documents, EntityKind::Company, legacy_id).await? {
            Some(company_id) => {
                self.clean_target(legacy_id, &company_id).await?;
                Ok(Some(company_id))
            }
            None => {
                clear_stale(&self.mapper, EntityKind::Company, legacy_id).await?;
                Ok(None)
            }
        }
    }

    async fn clean_all(&self) -> Result<CleanReport, AppError> {
        let media = self
            .media
            .delete_by_owner_kind(EntityKind::Company, LOGO_SLOT)
            .await;
        let ids = self.documents.list_ids(Company::COLLECTION).await?;
        let documents = self.documents.delete_many::<Company>(&ids).await?;
        let mappings = self.mapper.clear_all(EntityKind::Company).await?;

        Ok(CleanReport {
            kind: EntityKind::Company,
            documents,
            mappings,
            media,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_alias_list() {
        let legacy = LegacyCompany {
            company_id: 3,
            name: "Acme ".to_string(),
            alias: Some("ACME Corp".to_string()),
            location: None,
            avatar: None,
            mapped_id: String::new(),
        };
        let company = company_document("c1".to_string(), &legacy);
        assert_eq!(company.name, "Acme");
        assert_eq!(company.alias, vec!["ACME Corp"]);

        let bare = LegacyCompany { alias: None, ..legacy };
        assert!(company_document("c2".to_string(), &bare).alias.is_empty());
    }
}

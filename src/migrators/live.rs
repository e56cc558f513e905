use async_trait::async_trait;

use crate::context::{AppLegacy, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::legacy::LegacyLive;
use crate::migrators::past::{check_past, clear_stale, fetch_record, remap};
use crate::migrators::tables::{
    live_benefits, live_date, live_type, parse_students_recruited, semester,
};
use crate::migrators::{CleanReport, EntityMigrator, MigrationReport, MigrationStage};
use crate::models::{generate_id, Company, Document, EntityKind, LiveRecord};
use crate::repositories::{DocumentRepository, IdMapper};

/// Placement records. Their company must be migrated first.
#[derive(FromContext, Clone)]
pub struct LiveMigrator {
    legacy: AppLegacy,
    mapper: IdMapper,
    documents: DocumentRepository,
}

pub fn live_document(id: String, legacy: &LegacyLive) -> Result<LiveRecord, AppError> {
    let date = live_date(legacy.year, legacy.month, legacy.day);
    if date.is_none() {
        tracing::warn!(
            year = legacy.year,
            month = legacy.month,
            day = legacy.day,
            "Invalid placement date"
        );
    }

    Ok(LiveRecord {
        id,
        live_type: live_type(legacy.live_type, legacy.category.trim()),
        company: legacy.company_mapped_id.trim().to_string(),
        recruits: legacy.recruits,
        year: legacy.year,
        semester: semester(legacy.month),
        students_recruited: parse_students_recruited(&legacy.students_recruited)?,
        ctc: legacy.ctc.clone(),
        benefits: live_benefits(&legacy.bonus),
        date,
    })
}

impl LiveMigrator {
    async fn clean_target(&self, legacy_id: i64, live_id: &str) -> Result<(), AppError> {
        MigrationStage::CleanPast.enter();
        self.documents.delete_in(LiveRecord::COLLECTION, live_id).await?;
        self.mapper.clear(EntityKind::LiveRecord, legacy_id).await
    }

    async fn require_company(&self, legacy: &LegacyLive) -> Result<(), AppError> {
        let company = legacy.company_mapped_id.trim();
        if company.is_empty() || !self.documents.exists_in(Company::COLLECTION, company).await? {
            return Err(AppError::dependency(
                EntityKind::Company,
                format!("'{}' of live #{}", company, legacy.live_id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityMigrator for LiveMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::LiveRecord
    }

    async fn migrate_single(&self, legacy_id: i64) -> Result<MigrationReport, AppError> {
        let kind = EntityKind::LiveRecord;
        let row = fetch_record(self.legacy.as_ref(), kind, legacy_id).await?;
        let legacy = LegacyLive::from_row(&row)?;

        let replaced = check_past(&self.mapper, &self.documents, kind, legacy_id).await?;
        if let Some(old) = &replaced {
            self.clean_target(legacy_id, old).await?;
        }

        MigrationStage::FetchDependencies.enter();
        self.require_company(&legacy).await?;

        MigrationStage::Transduce.enter();
        let record = live_document(generate_id(), &legacy)?;

        MigrationStage::Persist.enter();
        self.documents.create(&record).await?;

        remap(&self.mapper, &self.documents, kind, legacy_id, &record.id).await?;

        Ok(MigrationReport {
            kind,
            legacy_id,
            new_id: record.id,
            replaced,
            media_ids: vec![],
        })
    }

    async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError> {
        let kind = EntityKind::LiveRecord;
        match check_past(&self.mapper, &self.documents, kind, legacy_id).await? {
            Some(live_id) => {
                self.clean_target(legacy_id, &live_id).await?;
                Ok(Some(live_id))
            }
            None => {
                clear_stale(&self.mapper, kind, legacy_id).await?;
                Ok(None)
            }
        }
    }

    async fn clean_all(&self) -> Result<CleanReport, AppError> {
        let ids = self.documents.list_ids(LiveRecord::COLLECTION).await?;
        let documents = self.documents.delete_many::<LiveRecord>(&ids).await?;
        let mappings = self.mapper.clear_all(EntityKind::LiveRecord).await?;

        Ok(CleanReport {
            kind: EntityKind::LiveRecord,
            documents,
            mappings,
            media: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_live() -> LegacyLive {
        LegacyLive {
            live_id: 8,
            company_mapped_id: " c1 ".to_string(),
            live_type: 1,
            category: "dream".to_string(),
            recruits: 2,
            year: 2019,
            month: 8,
            day: 14,
            students_recruited: r#"{"mtech": [{"branch": 3, "name": ["X", "Y"]}]}"#.to_string(),
            ctc: "12 LPA".to_string(),
            bonus: "0".to_string(),
            mapped_id: String::new(),
        }
    }

    #[test]
    fn test_live_document_fields() {
        let record = live_document("l1".to_string(), &legacy_live()).unwrap();
        assert_eq!(record.live_type, 2);
        assert_eq!(record.company, "c1");
        assert_eq!(record.semester, 0);
        assert_eq!(record.benefits, "");
        assert_eq!(record.students_recruited.len(), 2);
        assert_eq!(record.students_recruited[0].branch, "Chemical Engineering");
        assert_eq!(record.date.map(|d| d.to_string()).as_deref(), Some("2019-08-14"));
    }

    #[test]
    fn test_live_document_bad_students_json() {
        let legacy = LegacyLive {
            students_recruited: "{broken".to_string(),
            ..legacy_live()
        };
        assert!(live_document("l1".to_string(), &legacy).is_err());
    }
}

//! Steps shared by every migrator.

use crate::db::Row;
use crate::error::AppError;
use crate::legacy::LegacySource;
use crate::media::MediaPipeline;
use crate::migrators::MigrationStage;
use crate::models::{EntityKind, StoreSlot};
use crate::repositories::{DocumentRepository, IdMapper};

/// START: loads the legacy row or fails with `RecordNotFound`.
pub async fn fetch_record(
    legacy: &dyn LegacySource,
    kind: EntityKind,
    legacy_id: i64,
) -> Result<Row, AppError> {
    MigrationStage::Start.enter();
    legacy
        .fetch_record(kind, legacy_id)
        .await?
        .ok_or(AppError::RecordNotFound { kind, legacy_id })
}

/// CHECK_PAST_MIGRATION: the live target ID of a previous run, if any.
///
/// A mapping whose document is gone is logged and read as "not migrated".
pub async fn check_past(
    mapper: &IdMapper,
    documents: &DocumentRepository,
    kind: EntityKind,
    legacy_id: i64,
) -> Result<Option<String>, AppError> {
    MigrationStage::CheckPastMigration.enter();
    let Some(mapped) = mapper.lookup(kind, legacy_id).await? else {
        return Ok(None);
    };

    if documents.exists_in(kind.collection(), &mapped).await? {
        return Ok(Some(mapped));
    }

    let stale = AppError::MappingConsistency {
        kind,
        legacy_id,
        reason: format!("document {} no longer exists", mapped),
    };
    tracing::warn!(code = stale.code(), error = %stale, "Treating record as unmigrated");
    Ok(None)
}

/// Removes a missing-document mapping found outside a migration run.
pub async fn clear_stale(mapper: &IdMapper, kind: EntityKind, legacy_id: i64) -> Result<(), AppError> {
    if mapper.lookup(kind, legacy_id).await?.is_some() {
        mapper.clear(kind, legacy_id).await?;
    }
    Ok(())
}

/// REMAP for records without media. A failed mapping write also removes
/// the freshly created document.
pub async fn remap(
    mapper: &IdMapper,
    documents: &DocumentRepository,
    kind: EntityKind,
    legacy_id: i64,
    target_id: &str,
) -> Result<(), AppError> {
    MigrationStage::Remap.enter();
    let Err(err) = mapper.set(kind, legacy_id, target_id).await else {
        return Ok(());
    };

    tracing::warn!(code = err.code(), error = %err, target = %target_id, "Discarding unmapped document");
    if let Err(e) = documents.delete_in(kind.collection(), target_id).await {
        tracing::warn!(code = e.code(), error = %e, target = %target_id, "Could not delete document");
    }
    Err(err)
}

/// Undoes a record whose PERSIST or REMAP step failed part way.
///
/// Linked media, the document and the mapping are removed best-effort, so
/// the next run finds nothing to collide with.
pub struct Discard<'a> {
    pub mapper: &'a IdMapper,
    pub documents: &'a DocumentRepository,
    pub media: &'a MediaPipeline,
    pub kind: EntityKind,
    pub slot: StoreSlot,
}

impl Discard<'_> {
    pub async fn run(&self, legacy_id: i64, target_id: &str, cause: &AppError) {
        tracing::warn!(
            code = cause.code(),
            error = %cause,
            target = %target_id,
            "Discarding partially persisted record"
        );
        self.media.delete_for_owner(target_id, self.slot).await;

        if let Err(err) = self.documents.delete_in(self.kind.collection(), target_id).await {
            tracing::warn!(code = err.code(), error = %err, target = %target_id, "Could not delete document");
        }
        if let Err(err) = self.mapper.clear(self.kind, legacy_id).await {
            tracing::warn!(code = err.code(), error = %err, "Could not clear mapping");
        }
    }
}

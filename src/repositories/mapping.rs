//! Legacy-to-new ID mapping stored on the legacy rows themselves.

use crate::context::{AppLegacy, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::legacy::MappingColumns;
use crate::models::EntityKind;

/// Reads and writes the mapping columns of legacy records.
///
/// A blank mapping means no live target document exists. Writes go
/// straight through; callers only call [`set`](IdMapper::set) and
/// [`clear`](IdMapper::clear) after the paired document write succeeded.
#[derive(FromContext, Clone)]
pub struct IdMapper {
    legacy: AppLegacy,
}

impl IdMapper {
    pub fn new(legacy: AppLegacy) -> Self {
        Self { legacy }
    }

    /// Current target ID for a legacy record, if it was migrated.
    pub async fn lookup(&self, kind: EntityKind, legacy_id: i64) -> Result<Option<String>, AppError> {
        let columns = self.legacy.read_mapping(kind, legacy_id).await?;
        Ok(columns
            .map(|c| c.mapped_id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    /// Media IDs produced by the last migration of an article.
    pub async fn lookup_media(&self, legacy_id: i64) -> Result<Vec<String>, AppError> {
        let columns = self
            .legacy
            .read_mapping(EntityKind::Article, legacy_id)
            .await?;
        Ok(columns
            .and_then(|c| c.media_ids)
            .map(|ids| split_media_ids(&ids))
            .unwrap_or_default())
    }

    /// Legacy records of `kind` currently mapped to `new_id`.
    pub async fn legacy_ids_for(&self, kind: EntityKind, new_id: &str) -> Result<Vec<i64>, AppError> {
        self.legacy.mapped_legacy_ids(kind, new_id).await
    }

    pub async fn set(&self, kind: EntityKind, legacy_id: i64, new_id: &str) -> Result<(), AppError> {
        let columns = MappingColumns {
            mapped_id: new_id.to_string(),
            media_ids: None,
        };
        self.write(kind, legacy_id, &columns).await
    }

    /// Article variant that also records every produced media ID.
    pub async fn set_with_media(
        &self,
        legacy_id: i64,
        new_id: &str,
        media_ids: &[String],
    ) -> Result<(), AppError> {
        let columns = MappingColumns {
            mapped_id: new_id.to_string(),
            media_ids: Some(media_ids.join(",")),
        };
        self.write(EntityKind::Article, legacy_id, &columns).await
    }

    pub async fn clear(&self, kind: EntityKind, legacy_id: i64) -> Result<(), AppError> {
        let columns = MappingColumns {
            mapped_id: String::new(),
            media_ids: kind.tracks_media().then(String::new),
        };
        self.write(kind, legacy_id, &columns).await
    }

    pub async fn clear_all(&self, kind: EntityKind) -> Result<u64, AppError> {
        self.legacy
            .clear_all_mappings(kind)
            .await
            .map_err(|e| AppError::MappingWrite {
                kind,
                legacy_id: 0,
                reason: e.to_string(),
            })
    }

    async fn write(
        &self,
        kind: EntityKind,
        legacy_id: i64,
        columns: &MappingColumns,
    ) -> Result<(), AppError> {
        let touched = self
            .legacy
            .write_mapping(kind, legacy_id, columns)
            .await
            .map_err(|e| AppError::MappingWrite {
                kind,
                legacy_id,
                reason: e.to_string(),
            })?;

        if touched == 0 {
            return Err(AppError::MappingWrite {
                kind,
                legacy_id,
                reason: "legacy row does not exist".to_string(),
            });
        }
        Ok(())
    }
}

/// Splits a stored comma-separated media ID list.
pub fn split_media_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

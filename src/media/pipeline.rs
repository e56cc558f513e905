//! Source URL to uploaded asset plus media record.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::content::ContentMedia;
use crate::context::{AppEncoder, AppFetcher, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::media::store::AssetStores;
use crate::models::{
    asset_file_name, owner_folder, Document, EntityKind, LinkedTo, MediaAsset, MediaAuthor,
    MediaRole, StoreSlot,
};
use crate::repositories::DocumentRepository;

/// What a cleanup call removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MediaCleanup {
    pub remote_files: usize,
    pub records: u64,
}

/// Migrates images and cleans up previously migrated ones.
#[derive(FromContext, Clone)]
pub struct MediaPipeline {
    assets: AssetStores,
    documents: DocumentRepository,
    fetcher: AppFetcher,
    encoder: AppEncoder,
    config: Arc<Config>,
}

impl MediaPipeline {
    /// Download, re-encode, upload and record one image for `owner_id`.
    ///
    /// The upload happens before the record write; a failed record write
    /// leaves a stale remote file but never a duplicate record.
    pub async fn migrate(
        &self,
        source_url: &str,
        owner_kind: EntityKind,
        owner_id: &str,
        role: MediaRole,
        slot: StoreSlot,
    ) -> Result<MediaAsset, AppError> {
        let id = role.asset_id(owner_id);
        let file_name = asset_file_name(&id);
        let folder = role.folder(owner_kind);

        tracing::debug!(url = %source_url, asset = %id, "Downloading image");
        let source = self.fetcher.fetch(source_url).await?;

        tracing::debug!(asset = %id, bytes = source.len(), "Encoding image");
        let encoded = self.encoder.encode(source).await?;

        let tags = vec![owner_kind.as_str().to_string(), role.tag().to_string()];
        self.assets
            .get(slot)
            .upload(encoded.bytes, &file_name, &folder, &tags)
            .await?;

        let asset = MediaAsset {
            id,
            authors: vec![self.default_author()],
            store: slot,
            store_path: format!("{}{}", folder, file_name),
            media_type: 0,
            blurhash: Some(encoded.blurhash),
            linked_to: Some(LinkedTo {
                reference: owner_id.to_string(),
                on_model: owner_kind.model_name().to_string(),
            }),
        };

        // Asset IDs are deterministic, so a re-run replaces the old record.
        self.documents
            .delete_in(MediaAsset::COLLECTION, &asset.id)
            .await?;
        self.documents.create(&asset).await?;

        tracing::info!(asset = %asset.id, store = %slot, path = %asset.store_path, "Migrated image");
        Ok(asset)
    }

    /// Deletes one asset by ID from `slot` together with its record.
    pub async fn delete_by_name(&self, asset_id: &str, slot: StoreSlot) -> MediaCleanup {
        self.delete_many_by_name(&[asset_id.to_string()], slot).await
    }

    /// Deletes assets by ID from `slot` together with their records.
    ///
    /// Best-effort: remote and record failures are logged independently.
    pub async fn delete_many_by_name(&self, asset_ids: &[String], slot: StoreSlot) -> MediaCleanup {
        let mut cleanup = MediaCleanup::default();
        if asset_ids.is_empty() {
            return cleanup;
        }

        let store = self.assets.get(slot);
        let names: Vec<String> = asset_ids.iter().map(|id| asset_file_name(id)).collect();
        match store.list_by_name(&names).await {
            Ok(files) => {
                let file_ids: Vec<String> = files.into_iter().map(|f| f.file_id).collect();
                match store.bulk_delete(&file_ids).await {
                    Ok(()) => cleanup.remote_files = file_ids.len(),
                    Err(err) => {
                        tracing::warn!(code = err.code(), error = %err, store = %slot, "Could not delete remote assets")
                    }
                }
            }
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, store = %slot, "Could not list remote assets")
            }
        }

        match self.documents.delete_many::<MediaAsset>(asset_ids).await {
            Ok(n) => cleanup.records = n,
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "Could not delete media records")
            }
        }

        cleanup
    }

    /// Deletes every asset linked to `owner_id`.
    pub async fn delete_for_owner(&self, owner_id: &str, slot: StoreSlot) -> MediaCleanup {
        let linked = self
            .documents
            .find_by_field::<MediaAsset>("linkedTo.reference", owner_id)
            .await;

        match linked {
            Ok(assets) => {
                let ids: Vec<String> = assets.into_iter().map(|a| a.id).collect();
                self.delete_many_by_name(&ids, slot).await
            }
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, owner = %owner_id, "Could not look up linked media");
                MediaCleanup::default()
            }
        }
    }

    /// Deletes the owner kind's whole folder in `slot` and all its records.
    pub async fn delete_by_owner_kind(&self, owner_kind: EntityKind, slot: StoreSlot) -> MediaCleanup {
        let mut cleanup = MediaCleanup::default();
        let folder = owner_folder(owner_kind);

        if let Err(err) = self.assets.get(slot).delete_folder(&folder).await {
            tracing::warn!(code = err.code(), error = %err, folder = %folder, "Could not delete remote folder");
        }

        match self
            .documents
            .delete_where::<MediaAsset>("linkedTo.onModel", owner_kind.model_name())
            .await
        {
            Ok(ids) => cleanup.records = ids.len() as u64,
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "Could not delete media records")
            }
        }

        cleanup
    }

    fn default_author(&self) -> MediaAuthor {
        MediaAuthor {
            name: self.config.media.default_author_name.clone(),
            details: self.config.media.default_author_id.clone(),
        }
    }
}

#[async_trait]
impl ContentMedia for MediaPipeline {
    async fn migrate_content_image(
        &self,
        url: &str,
        owner_id: &str,
        ordinal: u32,
    ) -> Result<MediaAsset, AppError> {
        self.migrate(
            url,
            EntityKind::Article,
            owner_id,
            MediaRole::Content(ordinal),
            StoreSlot::ArchiveA,
        )
        .await
    }
}

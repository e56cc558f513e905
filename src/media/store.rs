//! Remote asset stores holding encoded media files.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::StoreSlot;

/// A file as reported by a remote asset store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub file_id: String,
    pub name: String,
    #[serde(default)]
    pub file_path: String,
}

/// One remote object store account.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Uploads under a fixed name; an existing file with that name is replaced.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
        tags: &[String],
    ) -> Result<RemoteFile, AppError>;

    /// Files whose name is one of `names`.
    async fn list_by_name(&self, names: &[String]) -> Result<Vec<RemoteFile>, AppError>;

    async fn delete_by_id(&self, file_id: &str) -> Result<(), AppError>;

    async fn bulk_delete(&self, file_ids: &[String]) -> Result<(), AppError>;

    /// Deletes a folder and everything under it.
    async fn delete_folder(&self, folder: &str) -> Result<(), AppError>;
}

/// The three asset stores, always addressed by an explicit slot.
#[derive(Clone)]
pub struct AssetStores {
    archive_a: Arc<dyn AssetStore>,
    archive_b: Arc<dyn AssetStore>,
    active: Arc<dyn AssetStore>,
}

impl AssetStores {
    pub fn new(
        archive_a: Arc<dyn AssetStore>,
        archive_b: Arc<dyn AssetStore>,
        active: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            archive_a,
            archive_b,
            active,
        }
    }

    pub fn get(&self, slot: StoreSlot) -> &Arc<dyn AssetStore> {
        match slot {
            StoreSlot::ArchiveA => &self.archive_a,
            StoreSlot::ArchiveB => &self.archive_b,
            StoreSlot::Active => &self.active,
        }
    }
}

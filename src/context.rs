//! Application context providing dependency injection root.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::backends::postgres::PostgresClient;
use crate::di::Context as ContextDerive;
use crate::error::AppError;
use crate::legacy::{LegacySource, SqlLegacySource};
use crate::media::{
    AssetStores, HttpImageFetcher, ImageEncoder, ImageFetcher, ImageKitStore, JpegBlurhashEncoder,
};
use crate::remote::{HttpContentApi, RemoteContentApi};
use crate::store::{DocumentStore, PgDocumentStore};

/// Read access to the legacy relational source.
pub type AppLegacy = Arc<dyn LegacySource>;
/// Target document store.
pub type AppDocuments = Arc<dyn DocumentStore>;
/// Legacy article body API.
pub type AppContentApi = Arc<dyn RemoteContentApi>;
pub type AppFetcher = Arc<dyn ImageFetcher>;
pub type AppEncoder = Arc<dyn ImageEncoder>;

/// Root application context for dependency injection.
///
/// The Context holds all shared dependencies and uses `#[derive(Context)]`
/// to generate `FromRef` implementations for each field, enabling
/// compile-time dependency resolution. Every field type must be distinct.
#[derive(ContextDerive, Clone)]
pub struct Context {
    pub legacy: AppLegacy,
    pub documents: AppDocuments,
    /// The three asset stores, addressed by slot.
    pub assets: AssetStores,
    pub content_api: AppContentApi,
    pub fetcher: AppFetcher,
    pub encoder: AppEncoder,
    pub config: Arc<Config>,
}

impl Context {
    /// Wires the production collaborators described by `config`.
    pub async fn connect(config: Config) -> Result<Self, AppError> {
        let legacy = PostgresClient::connect(&config.legacy.uri, config.legacy.pool_size).await?;
        let target = PostgresClient::connect(&config.target.uri, config.target.pool_size).await?;

        let assets = AssetStores::new(
            Arc::new(ImageKitStore::new(&config.assets.archive_a)?),
            Arc::new(ImageKitStore::new(&config.assets.archive_b)?),
            Arc::new(ImageKitStore::new(&config.assets.active)?),
        );
        let timeout = Duration::from_secs(config.content_api.timeout_secs);

        Ok(Self {
            legacy: Arc::new(SqlLegacySource::new(legacy)),
            documents: Arc::new(PgDocumentStore::new(target)),
            assets,
            content_api: Arc::new(HttpContentApi::new(&config.content_api)?),
            fetcher: Arc::new(HttpImageFetcher::new(timeout)?),
            encoder: Arc::new(JpegBlurhashEncoder::default()),
            config: Arc::new(config),
        })
    }
}

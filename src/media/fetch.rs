//! Downloading source images.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Downloads the raw bytes behind `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

/// Fetches images over HTTP.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::TransientIo(format!("empty body from {}", url)));
        }
        Ok(bytes.to_vec())
    }
}

//! ImageKit REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;

use crate::config::AssetStoreConfig;
use crate::error::AppError;
use crate::media::store::{AssetStore, RemoteFile};

/// Asset store backed by one ImageKit account.
///
/// Authenticates with the private key as the basic-auth user.
#[derive(Clone)]
pub struct ImageKitStore {
    client: Client,
    api_url: String,
    upload_url: String,
    private_key: String,
}

impl ImageKitStore {
    pub fn new(config: &AssetStoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            private_key: config.private_key.clone(),
        })
    }
}

/// Search expression matching files by exact name.
pub fn name_query(names: &[String]) -> String {
    match names {
        [single] => format!("name = \"{}\"", single),
        _ => {
            let quoted: Vec<String> = names.iter().map(|n| format!("\"{}\"", n)).collect();
            format!("name IN [{}]", quoted.join(","))
        }
    }
}

#[async_trait]
impl AssetStore for ImageKitStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
        tags: &[String],
    ) -> Result<RemoteFile, AppError> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("fileName", file_name.to_string())
            .text("folder", folder.to_string())
            .text("tags", tags.join(","))
            .text("useUniqueFileName", "false");

        let file = self
            .client
            .post(format!("{}/files/upload", self.upload_url))
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<RemoteFile>()
            .await?;

        tracing::debug!(file_id = %file.file_id, path = %file.file_path, "Uploaded asset");
        Ok(file)
    }

    async fn list_by_name(&self, names: &[String]) -> Result<Vec<RemoteFile>, AppError> {
        if names.is_empty() {
            return Ok(vec![]);
        }
        let files = self
            .client
            .get(format!("{}/files", self.api_url))
            .basic_auth(&self.private_key, Some(""))
            .query(&[("searchQuery", name_query(names))])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RemoteFile>>()
            .await?;
        Ok(files)
    }

    async fn delete_by_id(&self, file_id: &str) -> Result<(), AppError> {
        self.client
            .delete(format!("{}/files/{}", self.api_url, file_id))
            .basic_auth(&self.private_key, Some(""))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn bulk_delete(&self, file_ids: &[String]) -> Result<(), AppError> {
        if file_ids.is_empty() {
            return Ok(());
        }
        self.client
            .post(format!("{}/files/batch/deleteByFileIds", self.api_url))
            .basic_auth(&self.private_key, Some(""))
            .json(&json!({ "fileIds": file_ids }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_folder(&self, folder: &str) -> Result<(), AppError> {
        self.client
            .delete(format!("{}/folder", self.api_url))
            .basic_auth(&self.private_key, Some(""))
            .json(&json!({ "folderPath": folder }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_query() {
        assert_eq!(name_query(&["a.jpeg".into()]), r#"name = "a.jpeg""#);
        assert_eq!(
            name_query(&["a.jpeg".into(), "b.jpeg".into()]),
            r#"name IN ["a.jpeg","b.jpeg"]"#
        );
    }

    #[test]
    fn test_urls_are_normalized() {
        let store = ImageKitStore::new(&AssetStoreConfig {
            api_url: "https://api.example.org/v1/".into(),
            upload_url: "https://upload.example.org/api/v1".into(),
            private_key: "key".into(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(store.api_url, "https://api.example.org/v1");
        assert_eq!(store.upload_url, "https://upload.example.org/api/v1");
    }
}

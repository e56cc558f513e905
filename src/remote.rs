//! Read-only client for the legacy article body API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::config::ContentApiConfig;
use crate::error::AppError;

/// Body of one legacy article as served by the content API.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleBody {
    /// Raw content item list, validated later by the transducer.
    pub content: JsonValue,
    pub featured_image: Option<String>,
}

#[async_trait]
pub trait RemoteContentApi: Send + Sync {
    async fn fetch_article_body(&self, legacy_id: i64) -> Result<ArticleBody, AppError>;
}

#[derive(Deserialize)]
struct PostEnvelope {
    post: PostPayload,
}

#[derive(Deserialize)]
struct PostPayload {
    #[serde(default)]
    post_content: JsonValue,
    #[serde(default)]
    featured_image: Option<String>,
}

impl From<PostEnvelope> for ArticleBody {
    fn from(envelope: PostEnvelope) -> Self {
        // Some posts carry the item list as an encoded JSON string.
        let content = match envelope.post.post_content {
            JsonValue::String(encoded) => {
                serde_json::from_str(&encoded).unwrap_or(JsonValue::String(encoded))
            }
            other => other,
        };

        ArticleBody {
            content,
            featured_image: envelope
                .post
                .featured_image
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

/// `GET {base_url}/api/post/get/{id}`.
#[derive(Clone)]
pub struct HttpContentApi {
    client: Client,
    base_url: String,
}

impl HttpContentApi {
    pub fn new(config: &ContentApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn post_url(&self, legacy_id: i64) -> String {
        format!("{}/api/post/get/{}", self.base_url, legacy_id)
    }
}

#[async_trait]
impl RemoteContentApi for HttpContentApi {
    async fn fetch_article_body(&self, legacy_id: i64) -> Result<ArticleBody, AppError> {
        let envelope = self
            .client
            .get(self.post_url(legacy_id))
            .send()
            .await?
            .error_for_status()?
            .json::<PostEnvelope>()
            .await?;
        Ok(envelope.into())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContentBlock, Document};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAuthor {
    pub name: String,
    pub team: u8,
    /// Target user ID.
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCategory {
    pub subcategory: bool,
    pub number: i64,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleTag {
    pub name: String,
    pub is_admin: bool,
    pub reference: String,
}

/// Media IDs of the two cover crops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverMedia {
    pub square: String,
    pub rectangle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementCount {
    pub hits: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub article_type: u8,
    pub title: String,
    pub inshort: String,
    pub old_article_id: i64,
    pub users: Vec<ArticleAuthor>,
    pub categories: Vec<ArticleCategory>,
    pub tags: Vec<ArticleTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_media: Option<CoverMedia>,
    pub approval_status: bool,
    pub publish_status: u8,
    pub is_institute_restricted: bool,
    pub content: Vec<ContentBlock>,
    pub engagement_count: EngagementCount,
    pub read_time: i64,
    pub time_spent: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: String,
}

impl Article {
    /// Target user IDs of every credited author.
    pub fn author_ids(&self) -> Vec<String> {
        self.users.iter().map(|u| u.details.clone()).collect()
    }
}

impl Document for Article {
    const COLLECTION: &'static str = "articles";

    fn id(&self) -> &str {
        &self.id
    }
}

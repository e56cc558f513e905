use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Document, ImageRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    pub is_published: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub articles: Vec<String>,
    pub featured: Vec<String>,
}

impl Document for Issue {
    const COLLECTION: &'static str = "issues";

    fn id(&self) -> &str {
        &self.id
    }
}

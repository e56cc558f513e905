use serde::{Deserialize, Serialize};

use crate::models::{Document, ImageRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub alias: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<ImageRef>,
}

impl Document for Company {
    const COLLECTION: &'static str = "companies";

    fn id(&self) -> &str {
        &self.id
    }
}

use serde::{Deserialize, Serialize};

use crate::models::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryParent {
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// A pre-seeded category; not migrated, only resolved by number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap {
    pub id: String,
    pub number: i64,
    pub name: String,
    #[serde(default)]
    pub parent: Option<CategoryParent>,
}

impl CategoryMap {
    pub fn is_subcategory(&self) -> bool {
        self.parent
            .as_ref()
            .and_then(|p| p.reference.as_deref())
            .is_some_and(|r| !r.is_empty())
    }
}

impl Document for CategoryMap {
    const COLLECTION: &'static str = "categories";

    fn id(&self) -> &str {
        &self.id
    }
}

use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Post tags and admin labels share one collection, split by `isAdmin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
    pub admin_color: String,
}

impl Tag {
    pub const DEFAULT_COLOR: &'static str = "FFFFFF";
}

impl Document for Tag {
    const COLLECTION: &'static str = "tags";

    fn id(&self) -> &str {
        &self.id
    }
}

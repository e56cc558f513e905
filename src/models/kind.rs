//! Entity kinds and their legacy/target storage descriptors.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Column holding the legacy-to-new identifier on every legacy table.
pub const MAPPING_COLUMN: &str = "mapped_id";

/// Column holding comma-separated media IDs on the legacy posts table.
pub const MEDIA_IDS_COLUMN: &str = "media_ids";

/// Kinds of entities that can be migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    User,
    Article,
    Company,
    Issue,
    Tag,
    AdminTag,
    LiveRecord,
}

/// Legacy table and primary key holding the records of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyTable {
    pub table: &'static str,
    pub key: &'static str,
}

impl EntityKind {
    /// Kinds in dependency order: referenced kinds come before their dependents.
    pub const MIGRATION_ORDER: [EntityKind; 7] = [
        EntityKind::Tag,
        EntityKind::AdminTag,
        EntityKind::User,
        EntityKind::Company,
        EntityKind::Article,
        EntityKind::LiveRecord,
        EntityKind::Issue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Article => "article",
            EntityKind::Company => "company",
            EntityKind::Issue => "issue",
            EntityKind::Tag => "tag",
            EntityKind::AdminTag => "admin-tag",
            EntityKind::LiveRecord => "live",
        }
    }

    /// Target document collection.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Article => "articles",
            EntityKind::Company => "companies",
            EntityKind::Issue => "issues",
            EntityKind::Tag | EntityKind::AdminTag => "tags",
            EntityKind::LiveRecord => "live",
        }
    }

    /// Model name used in back-references (`linkedTo`, `contributions`).
    pub fn model_name(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Article => "Article",
            EntityKind::Company => "Company",
            EntityKind::Issue => "Issue",
            EntityKind::Tag | EntityKind::AdminTag => "Tag",
            EntityKind::LiveRecord => "Live",
        }
    }

    pub fn legacy_table(&self) -> LegacyTable {
        let (table, key) = match self {
            EntityKind::User => ("users", "user_id"),
            EntityKind::Article => ("posts", "post_id"),
            EntityKind::Company => ("companies", "company_id"),
            EntityKind::Issue => ("issues", "issue_id"),
            EntityKind::Tag => ("post_tag", "post_tag_id"),
            EntityKind::AdminTag => ("admin_labels", "admin_label_id"),
            EntityKind::LiveRecord => ("live", "live_id"),
        };
        LegacyTable { table, key }
    }

    /// Whether the legacy table also tracks produced media IDs.
    pub fn tracks_media(&self) -> bool {
        matches!(self, EntityKind::Article)
    }

    pub fn all() -> &'static [EntityKind] {
        &Self::MIGRATION_ORDER
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "users" => Ok(EntityKind::User),
            "article" | "articles" => Ok(EntityKind::Article),
            "company" | "companies" => Ok(EntityKind::Company),
            "issue" | "issues" => Ok(EntityKind::Issue),
            "tag" | "tags" => Ok(EntityKind::Tag),
            "admin-tag" | "admin-tags" => Ok(EntityKind::AdminTag),
            "live" | "live-record" | "live-records" => Ok(EntityKind::LiveRecord),
            _ => Err(format!(
                "Invalid entity kind '{}'. Valid values: user, article, company, issue, tag, admin-tag, live",
                s
            )),
        }
    }
}

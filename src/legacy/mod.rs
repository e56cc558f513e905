//! Read access to the legacy relational source.
//!
//! Every query is an intent ("list article IDs in a range", "authors of a
//! post") so callers never build SQL. Records come back as [`Row`]s and are
//! typed by the parsers in [`records`].

mod records;
mod sql;

pub use records::{
    parse_id_list, parse_legacy_datetime, LegacyArticle, LegacyCompany, LegacyIssue, LegacyLive,
    LegacyTag, LegacyUser,
};
pub use sql::SqlLegacySource;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Row;
use crate::error::AppError;
use crate::models::EntityKind;

/// Inclusive legacy ID range. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl IdRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: i64, end: i64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn lower(&self) -> i64 {
        self.start.unwrap_or(0)
    }

    pub fn upper(&self) -> i64 {
        self.end.unwrap_or(i64::MAX)
    }

    pub fn contains(&self, id: i64) -> bool {
        id >= self.lower() && id <= self.upper()
    }
}

/// Mapping columns as stored on a legacy row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingColumns {
    pub mapped_id: String,
    /// Only tracked for kinds with [`EntityKind::tracks_media`].
    pub media_ids: Option<String>,
}

#[async_trait]
pub trait LegacySource: Send + Sync {
    /// IDs of migratable records of `kind` within `range`, in processing order.
    async fn list_ids(&self, kind: EntityKind, range: IdRange) -> Result<Vec<i64>, AppError>;

    /// The full legacy row for one record, joined with what its parser needs.
    async fn fetch_record(&self, kind: EntityKind, legacy_id: i64) -> Result<Option<Row>, AppError>;

    /// Mapped IDs of the post's authors, in author order. Unmigrated authors
    /// come back as empty strings.
    async fn article_author_ids(&self, post_id: i64) -> Result<Vec<String>, AppError>;

    /// Leaf category numbers attached to the post.
    async fn article_category_numbers(&self, post_id: i64) -> Result<Vec<i64>, AppError>;

    /// Mapped IDs of the post's tags (`Tag`) or admin labels (`AdminTag`).
    async fn article_tag_ids(&self, kind: EntityKind, post_id: i64) -> Result<Vec<String>, AppError>;

    /// Mapped IDs of the post's creator and last modifier.
    async fn article_editor_ids(
        &self,
        post_id: i64,
    ) -> Result<(Option<String>, Option<String>), AppError>;

    /// Mapped IDs of the listed posts plus posts published within the dates.
    async fn issue_article_ids(
        &self,
        post_ids: &[i64],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError>;

    /// Mapped IDs of the listed posts, in list order.
    async fn post_mapped_ids(&self, post_ids: &[i64]) -> Result<Vec<String>, AppError>;

    async fn read_mapping(
        &self,
        kind: EntityKind,
        legacy_id: i64,
    ) -> Result<Option<MappingColumns>, AppError>;

    /// Legacy IDs of `kind` whose mapping points at `mapped_id`, ascending.
    async fn mapped_legacy_ids(&self, kind: EntityKind, mapped_id: &str) -> Result<Vec<i64>, AppError>;

    /// Overwrites the mapping columns. Returns the number of rows touched.
    async fn write_mapping(
        &self,
        kind: EntityKind,
        legacy_id: i64,
        columns: &MappingColumns,
    ) -> Result<u64, AppError>;

    /// Resets every mapping of `kind` to empty.
    async fn clear_all_mappings(&self, kind: EntityKind) -> Result<u64, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

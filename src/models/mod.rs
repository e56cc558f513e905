//! Target document models and the legacy descriptors they are built from.

mod article;
mod category;
mod company;
mod content;
mod issue;
mod kind;
mod live;
mod media;
mod tag;
mod user;

pub use article::{Article, ArticleAuthor, ArticleCategory, ArticleTag, CoverMedia, EngagementCount};
pub use category::{CategoryMap, CategoryParent};
pub use company::Company;
pub use content::{BlockFormatting, BlockKind, ContentBlock, ContentItemKind, LegacyContentItem};
pub use issue::Issue;
pub use kind::{EntityKind, LegacyTable, MAPPING_COLUMN, MEDIA_IDS_COLUMN};
pub use live::{LiveRecord, RecruitedStudent};
pub use media::{
    asset_file_name, owner_folder, ImageRef, LinkedTo, MediaAsset, MediaAuthor, MediaRole,
    StoreSlot,
};
pub use tag::Tag;
pub use user::{Contribution, User, UserProfile};

use serde::{de::DeserializeOwned, Serialize};
use ulid::Ulid;

/// A typed document stored in one collection of the target store.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Generates a new ULID string.
///
/// Target IDs are generated before any write so dependent media can
/// reference the document while it is being built.
pub fn generate_id() -> String {
    Ulid::new().to_string()
}

//! Media records describing uploaded assets.

use serde::{Deserialize, Serialize};

use crate::models::{Document, EntityKind};

/// Which asset store backs a media record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum StoreSlot {
    ArchiveA = 0,
    ArchiveB = 1,
    Active = 2,
}

impl StoreSlot {
    /// Picks the active store or the primary archive.
    pub fn select(use_active_store: bool) -> Self {
        if use_active_store {
            StoreSlot::Active
        } else {
            StoreSlot::ArchiveA
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreSlot::ArchiveA => "archive-a",
            StoreSlot::ArchiveB => "archive-b",
            StoreSlot::Active => "active",
        }
    }
}

impl From<StoreSlot> for u8 {
    fn from(slot: StoreSlot) -> Self {
        slot as u8
    }
}

impl TryFrom<u8> for StoreSlot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StoreSlot::ArchiveA),
            1 => Ok(StoreSlot::ArchiveB),
            2 => Ok(StoreSlot::Active),
            other => Err(format!("invalid store slot {}", other)),
        }
    }
}

impl std::fmt::Display for StoreSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoreSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "archive-a" => Ok(StoreSlot::ArchiveA),
            "archive-b" => Ok(StoreSlot::ArchiveB),
            "active" => Ok(StoreSlot::Active),
            _ => Err(format!(
                "Invalid store '{}'. Valid values: archive-a, archive-b, active",
                s
            )),
        }
    }
}

/// What an asset illustrates for its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRole {
    Profile,
    Logo,
    IssueCover,
    CoverSquare,
    CoverRectangle,
    /// The n-th image embedded in article content (1-based).
    Content(u32),
}

impl MediaRole {
    /// Deterministic asset ID derived from the owner.
    pub fn asset_id(&self, owner_id: &str) -> String {
        match self {
            MediaRole::Profile | MediaRole::Logo | MediaRole::IssueCover => owner_id.to_string(),
            MediaRole::CoverSquare => format!("{}-square", owner_id),
            MediaRole::CoverRectangle => format!("{}-rectangle", owner_id),
            MediaRole::Content(n) => format!("{}-content-{}", owner_id, n),
        }
    }

    /// Upload folder keyed by owner kind and role.
    pub fn folder(&self, owner_kind: EntityKind) -> String {
        match self {
            MediaRole::CoverSquare | MediaRole::CoverRectangle => {
                format!("/{}/cover/", owner_kind.as_str())
            }
            MediaRole::Content(_) => format!("/{}/content/", owner_kind.as_str()),
            _ => owner_folder(owner_kind),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            MediaRole::Profile => "profile",
            MediaRole::Logo => "logo",
            MediaRole::IssueCover => "cover",
            MediaRole::CoverSquare => "cover-square",
            MediaRole::CoverRectangle => "cover-rectangle",
            MediaRole::Content(_) => "content",
        }
    }
}

/// Root folder holding every asset of one owner kind.
pub fn owner_folder(owner_kind: EntityKind) -> String {
    format!("/{}/", owner_kind.as_str())
}

/// File name of an encoded asset.
pub fn asset_file_name(asset_id: &str) -> String {
    format!("{}.jpeg", asset_id)
}

/// Author credit attached to media and articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAuthor {
    pub name: String,
    pub details: String,
}

/// Weak back-reference to the entity an asset illustrates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedTo {
    pub reference: String,
    pub on_model: String,
}

/// A stored media record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: String,
    pub authors: Vec<MediaAuthor>,
    pub store: StoreSlot,
    pub store_path: String,
    /// 0 = image.
    pub media_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurhash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_to: Option<LinkedTo>,
}

impl MediaAsset {
    /// Embedded image reference used by users, companies and issues.
    pub fn image_ref(&self) -> ImageRef {
        ImageRef {
            store: self.store,
            store_path: self.store_path.clone(),
            blurhash: self.blurhash.clone(),
        }
    }
}

impl Document for MediaAsset {
    const COLLECTION: &'static str = "media";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Inline image pointer stored on documents that own a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub store: StoreSlot,
    pub store_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurhash: Option<String>,
}

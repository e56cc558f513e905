//! Structured content blocks and the legacy items they are built from.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Kind-specific payload of a content block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Quote,
    OrderedList,
    UnorderedList,
    Table {
        data: Vec<Vec<String>>,
        has_header_row: bool,
        has_header_column: bool,
    },
    Image {
        media: String,
    },
    Widget {
        url: String,
    },
}

impl BlockKind {
    /// Persisted content type code.
    pub fn code(&self) -> u8 {
        match self {
            BlockKind::Paragraph => 0,
            BlockKind::Heading1 => 1,
            BlockKind::Heading2 => 2,
            BlockKind::Heading3 => 3,
            BlockKind::Image { .. } => 4,
            BlockKind::Quote => 5,
            BlockKind::OrderedList => 6,
            BlockKind::UnorderedList => 7,
            BlockKind::Table { .. } => 8,
            BlockKind::Widget { .. } => 14,
        }
    }
}

const LIST_STYLE_ORDERED: u8 = 4;
const LIST_STYLE_UNORDERED: u8 = 5;

/// One typed unit of article content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredBlock", try_from = "StoredBlock")]
pub struct ContentBlock {
    /// Markdown text.
    pub text: String,
    pub kind: BlockKind,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Formatting hints for lists and tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFormatting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_style: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_header_row: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_header_column: Option<bool>,
}

/// Wire shape of a content block inside an article document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBlock {
    text: String,
    content_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_formatting: Option<BlockFormatting>,
}

impl From<ContentBlock> for StoredBlock {
    fn from(block: ContentBlock) -> Self {
        let content_type = block.kind.code();
        let mut stored = StoredBlock {
            text: block.text,
            content_type,
            media: None,
            data: None,
            block_formatting: None,
        };

        match block.kind {
            BlockKind::OrderedList => {
                stored.block_formatting = Some(BlockFormatting {
                    list_style: Some(LIST_STYLE_ORDERED),
                    ..Default::default()
                });
            }
            BlockKind::UnorderedList => {
                stored.block_formatting = Some(BlockFormatting {
                    list_style: Some(LIST_STYLE_UNORDERED),
                    ..Default::default()
                });
            }
            BlockKind::Table {
                data,
                has_header_row,
                has_header_column,
            } => {
                stored.data = Some(JsonValue::from(data));
                stored.block_formatting = Some(BlockFormatting {
                    list_style: None,
                    has_header_row: Some(has_header_row),
                    has_header_column: Some(has_header_column),
                });
            }
            BlockKind::Image { media } => stored.media = Some(media),
            BlockKind::Widget { url } => stored.data = Some(JsonValue::String(url)),
            _ => {}
        }

        stored
    }
}

impl TryFrom<StoredBlock> for ContentBlock {
    type Error = String;

    fn try_from(stored: StoredBlock) -> Result<Self, Self::Error> {
        let formatting = stored.block_formatting.unwrap_or_default();
        let kind = match stored.content_type {
            0 => BlockKind::Paragraph,
            1 => BlockKind::Heading1,
            2 => BlockKind::Heading2,
            3 => BlockKind::Heading3,
            4 => BlockKind::Image {
                media: stored.media.ok_or("image block without media")?,
            },
            5 => BlockKind::Quote,
            6 => BlockKind::OrderedList,
            7 => BlockKind::UnorderedList,
            8 => BlockKind::Table {
                data: stored
                    .data
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| format!("invalid table data: {}", e))?
                    .unwrap_or_default(),
                has_header_row: formatting.has_header_row.unwrap_or(false),
                has_header_column: formatting.has_header_column.unwrap_or(false),
            },
            14 => BlockKind::Widget {
                url: stored
                    .data
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or("widget block without url")?,
            },
            other => return Err(format!("unknown content type {}", other)),
        };

        Ok(ContentBlock {
            text: stored.text,
            kind,
        })
    }
}

/// Kinds of items in a legacy content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentItemKind {
    Quote,
    Image,
    List,
    Table,
    RichText,
    Widget,
}

impl ContentItemKind {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ContentItemKind::Quote),
            1 => Some(ContentItemKind::Image),
            2 => Some(ContentItemKind::List),
            3 => Some(ContentItemKind::Table),
            4 => Some(ContentItemKind::RichText),
            5 => Some(ContentItemKind::Widget),
            _ => None,
        }
    }
}

/// One `{type, content}` item of a legacy article body.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyContentItem {
    pub type_code: i64,
    pub content: String,
}

impl LegacyContentItem {
    pub fn new(type_code: i64, content: impl Into<String>) -> Self {
        Self {
            type_code,
            content: content.into(),
        }
    }

    /// Reads an item leniently: `type` may be a number or a numeric string.
    pub fn from_value(value: &JsonValue) -> Result<Self, String> {
        let type_code = match value.get("type") {
            Some(JsonValue::Number(n)) => n.as_i64(),
            Some(JsonValue::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("missing or invalid type in {}", value))?;

        let content = match value.get("content") {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self { type_code, content })
    }

    pub fn kind(&self) -> Option<ContentItemKind> {
        ContentItemKind::from_code(self.type_code)
    }

    pub fn to_value(&self) -> JsonValue {
        serde_json::json!({ "type": self.type_code, "content": self.content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_block_wire_shape() {
        let block = ContentBlock::new(
            BlockKind::Table {
                data: vec![vec!["a".into(), "b".into()]],
                has_header_row: true,
                has_header_column: false,
            },
            "Table Caption",
        );
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["contentType"], 8);
        assert_eq!(value["data"], json!([["a", "b"]]));
        assert_eq!(value["blockFormatting"]["hasHeaderRow"], true);

        let back: ContentBlock = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_list_style_codes() {
        let ordered = serde_json::to_value(ContentBlock::new(BlockKind::OrderedList, "1. a")).unwrap();
        let unordered =
            serde_json::to_value(ContentBlock::new(BlockKind::UnorderedList, "- a")).unwrap();
        assert_eq!(ordered["blockFormatting"]["listStyle"], 4);
        assert_eq!(unordered["blockFormatting"]["listStyle"], 5);
        assert_eq!(unordered["contentType"], 7);
    }

    #[test]
    fn test_legacy_item_lenient_type() {
        let item = LegacyContentItem::from_value(&json!({"type": "4", "content": "<p>x</p>"})).unwrap();
        assert_eq!(item.kind(), Some(ContentItemKind::RichText));

        assert!(LegacyContentItem::from_value(&json!({"content": "x"})).is_err());
        let unknown = LegacyContentItem::from_value(&json!({"type": 9})).unwrap();
        assert_eq!(unknown.kind(), None);
    }
}

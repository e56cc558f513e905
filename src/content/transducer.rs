//! Legacy content items to structured content blocks.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::config::RewriteConfig;
use crate::content::html;
use crate::context::Context;
use crate::di::FromRef;
use crate::error::AppError;
use crate::media::MediaPipeline;
use crate::models::{BlockKind, ContentBlock, ContentItemKind, LegacyContentItem, MediaAsset};

/// Read time assigned when the computed value floors to zero.
pub const DEFAULT_READ_TIME_SECONDS: i64 = 300;

const SECONDS_PER_WORD: f64 = 0.2;
const SECONDS_PER_IMAGE: f64 = 2.0;
const SECONDS_PER_WIDGET: f64 = 5.0;
const SECONDS_PER_CELL: f64 = 0.3;

pub const IMAGE_CAPTION: &str = "Image Caption";
pub const TABLE_CAPTION: &str = "Table Caption";
pub const WIDGET_CAPTION: &str = "Infogram Caption";

static PARAGRAPH_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p\b[^>]*>").expect("static pattern"));
static IFRAME_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)src\s*=\s*["']([^"']+)["']"#).expect("static pattern"));

/// Migrates images embedded in article content.
#[async_trait]
pub trait ContentMedia: Send + Sync {
    /// Migrates the `ordinal`-th (1-based) content image of `owner_id`.
    async fn migrate_content_image(
        &self,
        url: &str,
        owner_id: &str,
        ordinal: u32,
    ) -> Result<MediaAsset, AppError>;
}

/// Output of one transduction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransducedContent {
    /// Non-blank blocks in source order.
    pub blocks: Vec<ContentBlock>,
    /// Media records created for embedded images.
    pub media_ids: Vec<String>,
    pub read_time_seconds: i64,
}

/// Converts legacy content documents into content blocks.
#[derive(Clone)]
pub struct ContentTransducer {
    media: Arc<dyn ContentMedia>,
    rewrite: RewriteConfig,
}

impl FromRef<Context> for ContentTransducer {
    fn from_ref(ctx: &Context) -> Self {
        Self::new(
            Arc::new(MediaPipeline::from_ref(ctx)),
            ctx.config.rewrite.clone(),
        )
    }
}

/// Running state of one transduction.
#[derive(Default)]
struct Accumulator {
    blocks: Vec<ContentBlock>,
    media_ids: Vec<String>,
    read_time: f64,
    images_seen: u32,
}

impl Accumulator {
    fn push(&mut self, kind: BlockKind, text: String) {
        self.blocks.push(ContentBlock::new(kind, text));
    }

    fn finish(self) -> TransducedContent {
        let floored = self.read_time.floor() as i64;
        TransducedContent {
            blocks: self.blocks.into_iter().filter(|b| !b.is_blank()).collect(),
            media_ids: self.media_ids,
            read_time_seconds: if floored == 0 {
                DEFAULT_READ_TIME_SECONDS
            } else {
                floored
            },
        }
    }
}

impl ContentTransducer {
    pub fn new(media: Arc<dyn ContentMedia>, rewrite: RewriteConfig) -> Self {
        Self { media, rewrite }
    }

    /// Transduces a legacy content list for the document `owner_id`.
    ///
    /// Bad items are logged and dropped. Only a `content` value that is not
    /// a list fails the whole call.
    pub async fn transduce(
        &self,
        content: &JsonValue,
        owner_id: &str,
    ) -> Result<TransducedContent, AppError> {
        let items = content.as_array().ok_or_else(|| {
            AppError::ContentParse(format!("expected a list of content items, got {}", content))
        })?;

        let mut acc = Accumulator::default();
        for (index, value) in items.iter().enumerate() {
            let item = match LegacyContentItem::from_value(value) {
                Ok(item) => item,
                Err(reason) => {
                    log_item_error(AppError::ContentItemParse { index, reason });
                    continue;
                }
            };

            match item.kind() {
                Some(ContentItemKind::Quote) => {
                    acc.read_time += word_seconds(&item.content);
                    acc.push(BlockKind::Quote, html::to_markdown(&item.content));
                }
                Some(ContentItemKind::Image) => {
                    self.image(&mut acc, &item.content, owner_id).await;
                }
                Some(ContentItemKind::List) => {
                    let kind = if item.content.contains("</ol>") {
                        BlockKind::OrderedList
                    } else {
                        BlockKind::UnorderedList
                    };
                    acc.read_time += word_seconds(&item.content);
                    acc.push(kind, html::to_markdown(&item.content));
                }
                Some(ContentItemKind::Table) => {
                    if let Err(reason) = table(&mut acc, &item.content) {
                        log_item_error(AppError::ContentItemParse { index, reason });
                    }
                }
                Some(ContentItemKind::RichText) => rich_text(&mut acc, &item.content),
                Some(ContentItemKind::Widget) => {
                    acc.read_time += SECONDS_PER_WIDGET;
                    let url = embeddable_widget_url(&widget_source(&item.content));
                    acc.push(BlockKind::Widget { url }, WIDGET_CAPTION.to_string());
                }
                None => log_item_error(AppError::ContentItemParse {
                    index,
                    reason: format!("unknown content type {}", item.type_code),
                }),
            }
        }

        Ok(acc.finish())
    }

    async fn image(&self, acc: &mut Accumulator, content: &str, owner_id: &str) {
        let url = self.rewrite.apply(content.trim());
        acc.images_seen += 1;

        match self
            .media
            .migrate_content_image(&url, owner_id, acc.images_seen)
            .await
        {
            Ok(asset) => {
                acc.read_time += SECONDS_PER_IMAGE;
                acc.media_ids.push(asset.id.clone());
                acc.push(BlockKind::Image { media: asset.id }, IMAGE_CAPTION.to_string());
            }
            Err(err) => {
                tracing::error!(
                    code = err.code(),
                    url = %url,
                    owner = %owner_id,
                    error = %err,
                    "Skipping content image"
                );
            }
        }
    }
}

fn log_item_error(err: AppError) {
    tracing::error!(code = err.code(), error = %err, "Dropping content item");
}

/// Seconds contributed by words longer than three characters.
fn word_seconds(raw: &str) -> f64 {
    raw.split(' ').filter(|w| w.chars().count() > 3).count() as f64 * SECONDS_PER_WORD
}

fn table(acc: &mut Accumulator, content: &str) -> Result<(), String> {
    let (tables, prose) = html::split_tables(content);
    let first = tables
        .first()
        .ok_or_else(|| "table item without a <table>".to_string())?;

    let parsed = html::parse_table(first);
    let columns = parsed.rows.first().map_or(1, Vec::len);
    acc.read_time += (parsed.rows.len() * columns) as f64 * SECONDS_PER_CELL;

    let caption = html::to_markdown(&prose);
    let text = if caption.is_empty() {
        TABLE_CAPTION.to_string()
    } else {
        caption
    };
    acc.push(
        BlockKind::Table {
            data: parsed.rows,
            has_header_row: parsed.has_header_row,
            has_header_column: parsed.has_header_column,
        },
        text,
    );
    Ok(())
}

fn rich_text(acc: &mut Accumulator, content: &str) {
    let opened = PARAGRAPH_OPEN.replace_all(content, "");
    for fragment in opened.split("</p>").filter(|f| !f.trim().is_empty()) {
        match heading_level(fragment) {
            Some(kind) => {
                let stripped = html::remove_tags(fragment);
                acc.read_time += word_seconds(&stripped);
                acc.push(kind, html::to_markdown(&stripped));
            }
            None => {
                acc.read_time += word_seconds(fragment);
                acc.push(BlockKind::Paragraph, html::to_markdown(fragment));
            }
        }
    }
}

/// Heading kind of a rich-text fragment, by the strongest marker present.
pub fn heading_level(fragment: &str) -> Option<BlockKind> {
    let lower = fragment.to_ascii_lowercase();
    let has = |tags: &[&str]| tags.iter().any(|t| lower.contains(&format!("<{}", t)));

    if has(&["h1", "h2"]) {
        Some(BlockKind::Heading1)
    } else if has(&["h3"]) {
        Some(BlockKind::Heading2)
    } else if has(&["h4", "h5", "h6"]) {
        Some(BlockKind::Heading3)
    } else {
        None
    }
}

fn widget_source(content: &str) -> String {
    IFRAME_SRC
        .captures(content)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| content.trim().to_string())
}

/// Rewrites an infogram URL to its embeddable host. Idempotent.
pub fn embeddable_widget_url(url: &str) -> String {
    if url.contains("e.infogram.com") {
        return url.to_string();
    }
    url.replacen("www.infogram.com", "e.infogram.com", 1)
        .replacen("//infogram.com", "//e.infogram.com", 1)
}

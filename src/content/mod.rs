//! Content transduction: legacy HTML items to typed content blocks.

pub mod html;
mod transducer;

pub use transducer::{
    embeddable_widget_url, heading_level, ContentMedia, ContentTransducer, TransducedContent,
    DEFAULT_READ_TIME_SECONDS, IMAGE_CAPTION, TABLE_CAPTION, WIDGET_CAPTION,
};

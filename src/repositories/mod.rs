//! Data access layer over the legacy source and the document store.
//!
//! Repositories use the `FromContext` derive macro for dependency injection.

mod category;
mod document;
mod mapping;

pub use category::{category_lineage, CategoryRepository};
pub use document::DocumentRepository;
pub use mapping::{split_media_ids, IdMapper};

//! docshift - legacy content platform migration
//!
//! Moves a relational content platform (users, articles, companies, tags,
//! issues, placement records and their images) into a document store,
//! keeping a re-runnable legacy-to-new ID mapping on the legacy rows.

pub mod cli;
pub mod config;
pub mod content;
pub mod context;
pub mod db;
pub mod di;
pub mod error;
pub mod legacy;
pub mod media;
pub mod migrators;
pub mod models;
pub mod remote;
pub mod repositories;
pub mod schema;
pub mod store;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;

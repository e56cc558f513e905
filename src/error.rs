//! Application error types with stable error codes.

use thiserror::Error;

use crate::models::EntityKind;

/// Application-level errors for docshift.
#[derive(Error, Debug)]
pub enum AppError {
    // PostgreSQL errors
    #[error("PostgreSQL connection error: {0}")]
    Connection(#[from] tokio_postgres::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query error: {message}")]
    Query { message: String, query: String },

    // Migration errors
    #[error("Legacy {kind} record #{legacy_id} not found")]
    RecordNotFound { kind: EntityKind, legacy_id: i64 },

    #[error("Dependency not found: {kind} {reference}")]
    DependencyNotFound { kind: EntityKind, reference: String },

    #[error("Mapping for {kind} #{legacy_id} is inconsistent: {reason}")]
    MappingConsistency {
        kind: EntityKind,
        legacy_id: i64,
        reason: String,
    },

    #[error("Could not write mapping for {kind} #{legacy_id}: {reason}")]
    MappingWrite {
        kind: EntityKind,
        legacy_id: i64,
        reason: String,
    },

    // Content errors
    #[error("Content could not be iterated: {0}")]
    ContentParse(String),

    #[error("Content item #{index} could not be parsed: {reason}")]
    ContentItemParse { index: usize, reason: String },

    // Media and transport errors
    #[error("Transient I/O failure: {0}")]
    TransientIo(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing failed: {0}")]
    Image(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Pool(_) => "POOL_ERROR",
            AppError::Query { .. } => "QUERY_ERROR",
            AppError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            AppError::DependencyNotFound { .. } => "DEPENDENCY_NOT_FOUND",
            AppError::MappingConsistency { .. } => "MAPPING_CONSISTENCY",
            AppError::MappingWrite { .. } => "MAPPING_WRITE",
            AppError::ContentParse(_) => "CONTENT_PARSE",
            AppError::ContentItemParse { .. } => "CONTENT_ITEM_PARSE",
            AppError::TransientIo(_) => "TRANSIENT_IO",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Image(_) => "IMAGE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure came from a network or storage transport.
    ///
    /// Media steps downgrade these to a skipped image.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::TransientIo(_) | AppError::Http(_) | AppError::Pool(_)
        )
    }

    pub fn dependency(kind: EntityKind, reference: impl Into<String>) -> Self {
        AppError::DependencyNotFound {
            kind,
            reference: reference.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::dependency(EntityKind::User, "42");
        assert_eq!(err.code(), "DEPENDENCY_NOT_FOUND");
        assert_eq!(err.to_string(), "Dependency not found: user 42");

        let err = AppError::ContentItemParse {
            index: 3,
            reason: "unknown type 9".into(),
        };
        assert_eq!(err.code(), "CONTENT_ITEM_PARSE");
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::TransientIo("timeout".into()).is_transient());
        assert!(!AppError::Internal("bug".into()).is_transient());
        assert!(!AppError::dependency(EntityKind::Tag, "7").is_transient());
    }
}

//! Database error types for prism-db.

use prism_core::enums::CollectionKind;
use prism_schema::ValidationError;
use thiserror::Error;

/// Errors from store, router, and service operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned an unreadable row.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// No document with this id.
    #[error("{collection} document '{id}' not found")]
    NotFound {
        collection: CollectionKind,
        id: String,
    },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An index could not be created or verified, or was never ensured.
    #[error("Index '{index}' unavailable: {reason}")]
    IndexUnavailable { index: String, reason: String },

    /// The candidate document failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// `sourceId` or `issueId` names a document that does not exist.
    #[error("{field} references missing document '{id}'")]
    MissingReference { field: &'static str, id: String },

    /// The issue still has articles and cannot be deleted.
    #[error("issue '{id}' is still referenced by {articles} article(s)")]
    StillReferenced { id: String, articles: u64 },

    /// Insert with an `_id` that already exists.
    #[error("{collection} document '{id}' already exists")]
    Duplicate {
        collection: CollectionKind,
        id: String,
    },

    /// Malformed request or continuation token.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(collection: CollectionKind, id: &str) -> Self {
        Self::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}

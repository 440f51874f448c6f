//! Results of successful writes.

use std::fmt;

use serde::Serialize;

/// Non-fatal data-integrity finding surfaced alongside a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// The article's media source no longer exists; it was left out of the
    /// issue's coverage counts.
    UnresolvedSource {
        article_id: String,
        source_id: String,
        issue_id: String,
    },
    /// The issue an aggregate was recomputed for does not exist.
    MissingIssue { issue_id: String },
    /// Recomputation kept failing; the issue keeps its previous aggregate
    /// until reconciled.
    AggregateStale { issue_id: String, reason: String },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedSource {
                article_id,
                source_id,
                issue_id,
            } => write!(
                f,
                "article '{article_id}' in issue '{issue_id}' references missing media source '{source_id}'"
            ),
            Self::MissingIssue { issue_id } => write!(f, "issue '{issue_id}' does not exist"),
            Self::AggregateStale { issue_id, reason } => {
                write!(f, "aggregate for issue '{issue_id}' is stale: {reason}")
            }
        }
    }
}

/// A stored document plus any integrity warnings raised while writing it.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome<T> {
    pub document: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<IntegrityWarning>,
}

impl<T> WriteOutcome<T> {
    #[must_use]
    pub const fn clean(document: T) -> Self {
        Self {
            document,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_warnings(document: T, warnings: Vec<IntegrityWarning>) -> Self {
        Self { document, warnings }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WriteOutcome<U> {
        WriteOutcome {
            document: f(self.document),
            warnings: self.warnings,
        }
    }
}

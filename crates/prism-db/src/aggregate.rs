//! Issue aggregate maintenance.
//!
//! An issue's coverage spectrum and its left/center/right keyword lists are a
//! pure function of the articles currently filed under it. Every relevant
//! write recomputes that function from the live article set, never by
//! applying deltas. Recomputation for one issue id runs inside a keyed
//! critical section and re-reads inside it, so concurrent writers cannot
//! overwrite each other's result with a stale one.

use std::collections::BTreeSet;

use prism_core::entities::CoverageSpectrum;
use prism_core::enums::{Bucket, Perspective};

use crate::NewsDb;
use crate::error::DatabaseError;
use crate::locks::KeyedLocks;
use crate::outcome::IntegrityWarning;
use crate::retry::{RetryConfig, is_retryable, retry_with_backoff};

/// One article as seen by recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMember {
    pub article_id: String,
    pub source_id: String,
    pub keywords: Vec<String>,
    /// Live perspective of the article's source; `None` if the source is gone.
    pub perspective: Option<Perspective>,
}

/// The cached fields of an issue that derive from its articles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueAggregate {
    pub spectrum: CoverageSpectrum,
    pub left_keywords: Vec<String>,
    pub center_keywords: Vec<String>,
    pub right_keywords: Vec<String>,
}

/// Fold an issue's articles into its aggregate.
///
/// Articles without a resolvable source are skipped and reported.
#[must_use]
pub fn compute_aggregate(
    issue_id: &str,
    members: &[ArticleMember],
) -> (IssueAggregate, Vec<IntegrityWarning>) {
    let mut counts = [0u32; 3];
    let mut keywords: [BTreeSet<&str>; 3] = Default::default();
    let mut warnings = Vec::new();

    for member in members {
        let Some(perspective) = member.perspective else {
            warnings.push(IntegrityWarning::UnresolvedSource {
                article_id: member.article_id.clone(),
                source_id: member.source_id.clone(),
                issue_id: issue_id.to_string(),
            });
            continue;
        };
        let slot = match perspective.bucket() {
            Bucket::Left => 0,
            Bucket::Center => 1,
            Bucket::Right => 2,
        };
        counts[slot] = counts[slot].saturating_add(1);
        keywords[slot].extend(member.keywords.iter().map(String::as_str));
    }

    let [left, center, right]: [Vec<String>; 3] =
        keywords.map(|set| set.into_iter().map(str::to_string).collect());
    let aggregate = IssueAggregate {
        spectrum: CoverageSpectrum::from_counts(counts[0], counts[1], counts[2]),
        left_keywords: left,
        center_keywords: center,
        right_keywords: right,
    };
    (aggregate, warnings)
}

/// Serialized, retrying recomputation of issue aggregates.
#[derive(Debug, Default)]
pub struct AggregateMaintainer {
    locks: KeyedLocks,
    retry: RetryConfig,
}

impl AggregateMaintainer {
    #[must_use]
    pub fn new(retry: RetryConfig) -> Self {
        Self {
            locks: KeyedLocks::new(),
            retry,
        }
    }

    /// Recompute and persist one issue's aggregate.
    ///
    /// Never fails the caller: exhausted retries leave the previous aggregate
    /// in place and come back as [`IntegrityWarning::AggregateStale`].
    pub async fn recompute(&self, db: &NewsDb, issue_id: &str) -> Vec<IntegrityWarning> {
        let _guard = self.locks.lock(issue_id).await;
        let result = retry_with_backoff(&self.retry, is_retryable, move || {
            Self::recompute_once(db, issue_id)
        })
        .await;

        match result {
            Ok(warnings) => warnings,
            Err(e) => {
                tracing::error!(
                    issue_id,
                    attempts = self.retry.max_attempts,
                    error = %e,
                    "aggregate recomputation exhausted retries; keeping last known value"
                );
                vec![IntegrityWarning::AggregateStale {
                    issue_id: issue_id.to_string(),
                    reason: e.to_string(),
                }]
            }
        }
    }

    /// Recompute several issues in order, collecting warnings.
    pub async fn recompute_all<'a>(
        &self,
        db: &NewsDb,
        issue_ids: impl IntoIterator<Item = &'a str>,
    ) -> Vec<IntegrityWarning> {
        let mut warnings = Vec::new();
        for issue_id in issue_ids {
            warnings.extend(self.recompute(db, issue_id).await);
        }
        warnings
    }

    async fn recompute_once(
        db: &NewsDb,
        issue_id: &str,
    ) -> Result<Vec<IntegrityWarning>, DatabaseError> {
        if !db.issue_exists(issue_id).await? {
            tracing::warn!(issue_id, "recompute requested for missing issue");
            return Ok(vec![IntegrityWarning::MissingIssue {
                issue_id: issue_id.to_string(),
            }]);
        }

        let members = db.issue_members(issue_id).await?;
        let (aggregate, warnings) = compute_aggregate(issue_id, &members);
        db.write_issue_aggregate(issue_id, &aggregate).await?;

        for warning in &warnings {
            tracing::warn!(issue_id, %warning, "article excluded from coverage");
        }
        tracing::debug!(
            issue_id,
            left = aggregate.spectrum.left,
            center = aggregate.spectrum.center,
            right = aggregate.spectrum.right,
            "aggregate recomputed"
        );
        Ok(warnings)
    }
}

//! `NewsService`: the write and read paths over all three collections.
//!
//! Writes run validate → referential checks → store → aggregate maintenance.
//! Reads go through the query router and require the collection's indexes.

use std::collections::BTreeSet;

use chrono::Utc;
use prism_config::{PrismConfig, QueryConfig};
use prism_core::document::Document;
use prism_core::entities::{Article, CoverageSpectrum, Issue, MediaSource};
use prism_core::enums::CollectionKind;
use serde_json::Value;

use crate::NewsDb;
use crate::aggregate::AggregateMaintainer;
use crate::error::DatabaseError;
use crate::locks::KeyedLocks;
use crate::outcome::{IntegrityWarning, WriteOutcome};
use crate::retry::RetryConfig;
use crate::router::{ArticleQuery, IssueQuery, MediaSourceQuery, Page, PageRequest};

pub struct NewsService {
    db: NewsDb,
    maintainer: AggregateMaintainer,
    /// Held per article id from reading the stored article until its issues
    /// are recomputed.
    article_locks: KeyedLocks,
    query: QueryConfig,
}

impl NewsService {
    /// Open the configured database and ensure every collection's indexes.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::IndexUnavailable` if any index cannot be
    /// created or verified, or any error from opening the database.
    pub async fn open(config: &PrismConfig) -> Result<Self, DatabaseError> {
        let db = NewsDb::open_local(&config.database.path).await?;
        let service = Self::new(db, config);
        service.ensure_all_indexes().await?;
        tracing::debug!(path = %config.database.path, "news service ready");
        Ok(service)
    }

    /// Wrap an open database without touching its indexes.
    #[must_use]
    pub fn new(db: NewsDb, config: &PrismConfig) -> Self {
        Self {
            db,
            maintainer: AggregateMaintainer::new(RetryConfig::from(&config.aggregate)),
            article_locks: KeyedLocks::new(),
            query: config.query.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::IndexUnavailable` naming the failing index.
    pub async fn ensure_all_indexes(&self) -> Result<(), DatabaseError> {
        for kind in CollectionKind::ALL {
            self.db.ensure_indexes(kind).await?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn db(&self) -> &NewsDb {
        &self.db
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    /// Insert an issue. Coverage aggregates start from zero; `view` is kept
    /// as supplied.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` or `DatabaseError::Duplicate`.
    pub async fn insert_issue(&self, json: &Value) -> Result<WriteOutcome<Issue>, DatabaseError> {
        let mut issue = prism_schema::validate_issue(json)?;
        issue.coverage_spectrum = CoverageSpectrum::default();
        issue.left_keywords.clear();
        issue.center_keywords.clear();
        issue.right_keywords.clear();

        self.db.insert_issue(&issue).await?;
        tracing::debug!(issue_id = %issue.id, "issue inserted");
        Ok(WriteOutcome::clean(issue))
    }

    /// Replace an issue's content. Cached aggregates and `view` are kept;
    /// `updatedAt` defaults to now.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` or `DatabaseError::NotFound`.
    pub async fn update_issue(&self, json: &Value) -> Result<WriteOutcome<Issue>, DatabaseError> {
        let mut issue = prism_schema::validate_issue(json)?;
        issue.updated_at.get_or_insert_with(Utc::now);

        if !self.db.update_issue(&issue).await? {
            return Err(DatabaseError::not_found(CollectionKind::Issues, &issue.id));
        }
        tracing::debug!(issue_id = %issue.id, "issue updated");
        let stored = self.get_issue(&issue.id).await?;
        Ok(WriteOutcome::clean(stored))
    }

    /// Delete an issue that no article references.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::StillReferenced` if articles remain, or
    /// `DatabaseError::NotFound`.
    pub async fn delete_issue(&self, id: &str) -> Result<(), DatabaseError> {
        if self.db.delete_unreferenced_issue(id).await? {
            tracing::debug!(issue_id = id, "issue deleted");
            return Ok(());
        }
        let articles = self.db.count_issue_articles(id).await?;
        if articles > 0 {
            return Err(DatabaseError::StillReferenced {
                id: id.to_string(),
                articles,
            });
        }
        Err(DatabaseError::not_found(CollectionKind::Issues, id))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no issue has this id.
    pub async fn get_issue(&self, id: &str) -> Result<Issue, DatabaseError> {
        self.db
            .find_issue(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(CollectionKind::Issues, id))
    }

    /// Atomically add one to an issue's view counter.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no issue has this id.
    pub async fn increment_view(&self, id: &str) -> Result<u64, DatabaseError> {
        self.db
            .increment_issue_view(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(CollectionKind::Issues, id))
    }

    /// Recompute one issue's aggregate from its live articles.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no issue has this id.
    pub async fn reconcile_issue(&self, id: &str) -> Result<WriteOutcome<Issue>, DatabaseError> {
        if !self.db.issue_exists(id).await? {
            return Err(DatabaseError::not_found(CollectionKind::Issues, id));
        }
        let warnings = self.maintainer.recompute(&self.db, id).await;
        let issue = self.get_issue(id).await?;
        Ok(WriteOutcome::with_warnings(issue, warnings))
    }

    // -----------------------------------------------------------------------
    // Articles
    // -----------------------------------------------------------------------

    /// Insert an article and recompute its issue.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation`, `DatabaseError::MissingReference`
    /// or `DatabaseError::Duplicate`.
    pub async fn insert_article(
        &self,
        json: &Value,
    ) -> Result<WriteOutcome<Article>, DatabaseError> {
        let mut article = prism_schema::validate_article(json)?;
        self.resolve_references(&mut article).await?;

        self.db.insert_article(&article).await?;
        tracing::debug!(article_id = %article.id, issue_id = ?article.issue_id, "article inserted");

        let warnings = self
            .maintainer
            .recompute_all(&self.db, article.issue_id.as_deref())
            .await;
        Ok(WriteOutcome::with_warnings(article, warnings))
    }

    /// Replace an article. Both the previous and the new issue are
    /// recomputed when `issueId`, `sourceId` or `keywords` change.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation`, `DatabaseError::MissingReference`
    /// or `DatabaseError::NotFound`.
    pub async fn update_article(
        &self,
        json: &Value,
    ) -> Result<WriteOutcome<Article>, DatabaseError> {
        let mut article = prism_schema::validate_article(json)?;
        let _guard = self.article_locks.lock(&article.id).await;
        let previous = self.get_article(&article.id).await?;
        self.resolve_references(&mut article).await?;

        if !self.db.update_article(&article).await? {
            return Err(DatabaseError::not_found(CollectionKind::Articles, &article.id));
        }
        tracing::debug!(article_id = %article.id, "article updated");

        let affects_aggregate = previous.issue_id != article.issue_id
            || previous.source_id != article.source_id
            || previous.keywords != article.keywords;
        let warnings = if affects_aggregate {
            let affected: BTreeSet<&str> = previous
                .issue_id
                .as_deref()
                .into_iter()
                .chain(article.issue_id.as_deref())
                .collect();
            self.maintainer.recompute_all(&self.db, affected).await
        } else {
            Vec::new()
        };
        Ok(WriteOutcome::with_warnings(article, warnings))
    }

    /// Delete an article and recompute its issue.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no article has this id.
    pub async fn delete_article(&self, id: &str) -> Result<Vec<IntegrityWarning>, DatabaseError> {
        let _guard = self.article_locks.lock(id).await;
        let article = self.get_article(id).await?;
        if !self.db.delete_article(id).await? {
            return Err(DatabaseError::not_found(CollectionKind::Articles, id));
        }
        tracing::debug!(article_id = id, "article deleted");
        Ok(self
            .maintainer
            .recompute_all(&self.db, article.issue_id.as_deref())
            .await)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no article has this id.
    pub async fn get_article(&self, id: &str) -> Result<Article, DatabaseError> {
        self.db
            .find_article(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(CollectionKind::Articles, id))
    }

    /// Check `sourceId`/`issueId` and embed the live source identity.
    async fn resolve_references(&self, article: &mut Article) -> Result<(), DatabaseError> {
        let source = self
            .db
            .find_media_source(&article.source_id)
            .await?
            .ok_or_else(|| DatabaseError::MissingReference {
                field: "sourceId",
                id: article.source_id.clone(),
            })?;
        if let Some(issue_id) = &article.issue_id {
            if !self.db.issue_exists(issue_id).await? {
                return Err(DatabaseError::MissingReference {
                    field: "issueId",
                    id: issue_id.clone(),
                });
            }
        }
        article.source = Some(source.embedded());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Media sources
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` or `DatabaseError::Duplicate`.
    pub async fn insert_media_source(
        &self,
        json: &Value,
    ) -> Result<WriteOutcome<MediaSource>, DatabaseError> {
        let source = prism_schema::validate_media_source(json)?;
        self.db.insert_media_source(&source).await?;
        tracing::debug!(source_id = %source.id, "media source inserted");
        Ok(WriteOutcome::clean(source))
    }

    /// Replace a media source. A name or perspective change is copied into
    /// every referencing article and the issues holding them are recomputed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` or `DatabaseError::NotFound`.
    pub async fn update_media_source(
        &self,
        json: &Value,
    ) -> Result<WriteOutcome<MediaSource>, DatabaseError> {
        let source = prism_schema::validate_media_source(json)?;
        let previous = self.get_media_source(&source.id).await?;
        if !self.db.update_media_source(&source).await? {
            return Err(DatabaseError::not_found(
                CollectionKind::MediaSources,
                &source.id,
            ));
        }

        if previous.name == source.name && previous.perspective == source.perspective {
            return Ok(WriteOutcome::clean(source));
        }
        let refreshed = self.db.refresh_embedded_source(&source).await?;
        tracing::debug!(source_id = %source.id, articles = refreshed, "embedded source refreshed");

        let affected = self.db.issues_citing_source(&source.id).await?;
        let warnings = self
            .maintainer
            .recompute_all(&self.db, affected.iter().map(String::as_str))
            .await;
        Ok(WriteOutcome::with_warnings(source, warnings))
    }

    /// Delete a media source. Issues holding its articles are recomputed and
    /// those articles come back as unresolved-source warnings.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no source has this id.
    pub async fn delete_media_source(
        &self,
        id: &str,
    ) -> Result<Vec<IntegrityWarning>, DatabaseError> {
        let affected = self.db.issues_citing_source(id).await?;
        if !self.db.delete_media_source(id).await? {
            return Err(DatabaseError::not_found(CollectionKind::MediaSources, id));
        }
        tracing::debug!(source_id = id, issues = affected.len(), "media source deleted");
        Ok(self
            .maintainer
            .recompute_all(&self.db, affected.iter().map(String::as_str))
            .await)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no source has this id.
    pub async fn get_media_source(&self, id: &str) -> Result<MediaSource, DatabaseError> {
        self.db
            .find_media_source(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(CollectionKind::MediaSources, id))
    }

    // -----------------------------------------------------------------------
    // Generic dispatch
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// See the per-collection insert operations.
    pub async fn insert(
        &self,
        kind: CollectionKind,
        json: &Value,
    ) -> Result<WriteOutcome<Document>, DatabaseError> {
        Ok(match kind {
            CollectionKind::Issues => self.insert_issue(json).await?.map(Document::from),
            CollectionKind::Articles => self.insert_article(json).await?.map(Document::from),
            CollectionKind::MediaSources => {
                self.insert_media_source(json).await?.map(Document::from)
            }
        })
    }

    /// # Errors
    ///
    /// See the per-collection update operations.
    pub async fn update(
        &self,
        kind: CollectionKind,
        json: &Value,
    ) -> Result<WriteOutcome<Document>, DatabaseError> {
        Ok(match kind {
            CollectionKind::Issues => self.update_issue(json).await?.map(Document::from),
            CollectionKind::Articles => self.update_article(json).await?.map(Document::from),
            CollectionKind::MediaSources => {
                self.update_media_source(json).await?.map(Document::from)
            }
        })
    }

    /// # Errors
    ///
    /// See the per-collection delete operations.
    pub async fn delete(
        &self,
        kind: CollectionKind,
        id: &str,
    ) -> Result<Vec<IntegrityWarning>, DatabaseError> {
        match kind {
            CollectionKind::Issues => self.delete_issue(id).await.map(|()| Vec::new()),
            CollectionKind::Articles => self.delete_article(id).await,
            CollectionKind::MediaSources => self.delete_media_source(id).await,
        }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no document has this id.
    pub async fn get(&self, kind: CollectionKind, id: &str) -> Result<Document, DatabaseError> {
        Ok(match kind {
            CollectionKind::Issues => self.get_issue(id).await?.into(),
            CollectionKind::Articles => self.get_article(id).await?.into(),
            CollectionKind::MediaSources => self.get_media_source(id).await?.into(),
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `DatabaseError::IndexUnavailable` if the issue indexes were
    /// never ensured, or `DatabaseError::InvalidQuery` for a bad request.
    pub async fn query_issues(
        &self,
        query: &IssueQuery,
        page: &PageRequest,
    ) -> Result<Page<Issue>, DatabaseError> {
        self.db.require_indexes(CollectionKind::Issues)?;
        let compiled = query.compile(page.token.as_deref(), self.query.page_size(page.limit))?;
        let items = self.db.find_issues(&compiled).await?;
        compiled.paginate(items)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::IndexUnavailable` if the article indexes were
    /// never ensured, or `DatabaseError::InvalidQuery` for a bad request.
    pub async fn query_articles(
        &self,
        query: &ArticleQuery,
        page: &PageRequest,
    ) -> Result<Page<Article>, DatabaseError> {
        self.db.require_indexes(CollectionKind::Articles)?;
        let compiled = query.compile(page.token.as_deref(), self.query.page_size(page.limit))?;
        let items = self.db.find_articles(&compiled).await?;
        compiled.paginate(items)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::IndexUnavailable` if the media source index
    /// was never ensured, or `DatabaseError::InvalidQuery` for a bad token.
    pub async fn query_media_sources(
        &self,
        query: &MediaSourceQuery,
        page: &PageRequest,
    ) -> Result<Page<MediaSource>, DatabaseError> {
        self.db.require_indexes(CollectionKind::MediaSources)?;
        let compiled = query.compile(page.token.as_deref(), self.query.page_size(page.limit))?;
        let items = self.db.find_media_sources(&compiled).await?;
        compiled.paginate(items)
    }
}

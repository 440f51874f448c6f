//! Physical index definitions and `ensure_indexes`.
//!
//! Every access pattern the router serves is pinned to one of these indexes
//! by name. B-tree indexes are plain `SQLite` indexes; weighted text indexes
//! are FTS5 external-content tables kept in sync with their collection by
//! triggers, ranked with `bm25()` using the column weights declared here.

use prism_core::enums::CollectionKind;
use tokio::sync::OnceCell;

use crate::NewsDb;
use crate::error::DatabaseError;

pub const ISSUES_BY_CATEGORY: &str = "idx_issues_category_created";
pub const ISSUES_BY_CREATED: &str = "idx_issues_created";
pub const ISSUES_BY_UPDATED: &str = "idx_issues_updated";
pub const ISSUES_TEXT: &str = "issues_fts";

pub const ARTICLES_BY_ISSUE: &str = "idx_articles_issue_published";
pub const ARTICLES_BY_ISSUE_PERSPECTIVE: &str = "idx_articles_issue_perspective_published";
pub const ARTICLES_BY_PUBLISHED: &str = "idx_articles_published";
pub const ARTICLES_BY_SOURCE: &str = "idx_articles_source_published";
pub const ARTICLES_TEXT: &str = "articles_fts";

pub const MEDIA_SOURCES_BY_PERSPECTIVE: &str = "idx_media_sources_perspective_name";

/// A column of a weighted text index.
#[derive(Debug, Clone, Copy)]
pub struct TextColumn {
    pub name: &'static str,
    pub weight: f64,
}

const fn weighted(name: &'static str, weight: f64) -> TextColumn {
    TextColumn { name, weight }
}

pub const ISSUE_TEXT_COLUMNS: &[TextColumn] = &[
    weighted("title", 10.0),
    weighted("summary", 5.0),
    weighted("left_summary", 1.0),
    weighted("center_summary", 1.0),
    weighted("right_summary", 1.0),
];

pub const ARTICLE_TEXT_COLUMNS: &[TextColumn] = &[weighted("title", 10.0), weighted("summary", 5.0)];

#[derive(Debug, Clone, Copy)]
pub enum IndexKind {
    /// Column list as written in `CREATE INDEX`, with sort directions.
    BTree(&'static str),
    Text(&'static [TextColumn]),
}

#[derive(Debug, Clone, Copy)]
pub struct IndexDef {
    pub name: &'static str,
    pub collection: CollectionKind,
    pub kind: IndexKind,
}

const fn btree(name: &'static str, collection: CollectionKind, columns: &'static str) -> IndexDef {
    IndexDef {
        name,
        collection,
        kind: IndexKind::BTree(columns),
    }
}

const fn text(
    name: &'static str,
    collection: CollectionKind,
    columns: &'static [TextColumn],
) -> IndexDef {
    IndexDef {
        name,
        collection,
        kind: IndexKind::Text(columns),
    }
}

const ISSUE_INDEXES: &[IndexDef] = &[
    btree(
        ISSUES_BY_CATEGORY,
        CollectionKind::Issues,
        "category ASC, created_at DESC",
    ),
    btree(ISSUES_BY_CREATED, CollectionKind::Issues, "created_at DESC"),
    btree(ISSUES_BY_UPDATED, CollectionKind::Issues, "updated_at DESC"),
    text(ISSUES_TEXT, CollectionKind::Issues, ISSUE_TEXT_COLUMNS),
];

const ARTICLE_INDEXES: &[IndexDef] = &[
    btree(
        ARTICLES_BY_ISSUE,
        CollectionKind::Articles,
        "issue_id ASC, published_at DESC",
    ),
    btree(
        ARTICLES_BY_ISSUE_PERSPECTIVE,
        CollectionKind::Articles,
        "issue_id ASC, perspective ASC, published_at DESC",
    ),
    btree(
        ARTICLES_BY_PUBLISHED,
        CollectionKind::Articles,
        "published_at DESC",
    ),
    btree(
        ARTICLES_BY_SOURCE,
        CollectionKind::Articles,
        "source_id ASC, published_at DESC",
    ),
    text(ARTICLES_TEXT, CollectionKind::Articles, ARTICLE_TEXT_COLUMNS),
];

const MEDIA_SOURCE_INDEXES: &[IndexDef] = &[btree(
    MEDIA_SOURCES_BY_PERSPECTIVE,
    CollectionKind::MediaSources,
    "perspective ASC, name ASC",
)];

/// The indexes owned by one collection.
#[must_use]
pub const fn indexes_for(kind: CollectionKind) -> &'static [IndexDef] {
    match kind {
        CollectionKind::Issues => ISSUE_INDEXES,
        CollectionKind::Articles => ARTICLE_INDEXES,
        CollectionKind::MediaSources => MEDIA_SOURCE_INDEXES,
    }
}

/// `bm25(<fts>, w1, w2, ...)` with the declared column weights.
#[must_use]
pub fn bm25_expr(fts: &str, columns: &[TextColumn]) -> String {
    let weights: Vec<String> = columns.iter().map(|c| format!("{:.1}", c.weight)).collect();
    format!("bm25({fts}, {})", weights.join(", "))
}

/// One-shot initialization state per collection.
#[derive(Debug, Default)]
pub(crate) struct IndexCells {
    issues: OnceCell<()>,
    articles: OnceCell<()>,
    media_sources: OnceCell<()>,
}

impl IndexCells {
    const fn cell(&self, kind: CollectionKind) -> &OnceCell<()> {
        match kind {
            CollectionKind::Issues => &self.issues,
            CollectionKind::Articles => &self.articles,
            CollectionKind::MediaSources => &self.media_sources,
        }
    }
}

fn unavailable(index: &str, reason: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::IndexUnavailable {
        index: index.to_string(),
        reason: reason.to_string(),
    }
}

impl NewsDb {
    /// Create and verify every index of `kind`. Runs at most once per handle;
    /// concurrent callers wait for the first to finish.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::IndexUnavailable` naming the index that could
    /// not be created or was missing afterwards.
    pub async fn ensure_indexes(&self, kind: CollectionKind) -> Result<(), DatabaseError> {
        self.indexes
            .cell(kind)
            .get_or_try_init(|| self.create_indexes(kind))
            .await?;
        Ok(())
    }

    /// Fail unless `ensure_indexes(kind)` has completed on this handle.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::IndexUnavailable`.
    pub fn require_indexes(&self, kind: CollectionKind) -> Result<(), DatabaseError> {
        if self.indexes.cell(kind).initialized() {
            return Ok(());
        }
        let first = indexes_for(kind).first().map_or(kind.table(), |def| def.name);
        Err(unavailable(
            first,
            format!("indexes for {kind} were never ensured"),
        ))
    }

    async fn create_indexes(&self, kind: CollectionKind) -> Result<(), DatabaseError> {
        let table = kind.table();
        for def in indexes_for(kind) {
            match def.kind {
                IndexKind::BTree(columns) => {
                    let sql = format!(
                        "CREATE INDEX IF NOT EXISTS {} ON {table}({columns})",
                        def.name
                    );
                    self.conn
                        .execute(&sql, ())
                        .await
                        .map_err(|e| unavailable(def.name, e))?;
                }
                IndexKind::Text(columns) => {
                    let existed = self.schema_object_exists("table", def.name).await?;
                    self.conn
                        .execute_batch(&text_index_sql(def.name, table, columns))
                        .await
                        .map_err(|e| unavailable(def.name, e))?;
                    if !existed {
                        let rebuild =
                            format!("INSERT INTO {0}({0}) VALUES ('rebuild')", def.name);
                        self.conn
                            .execute(&rebuild, ())
                            .await
                            .map_err(|e| unavailable(def.name, e))?;
                    }
                }
            }
            tracing::debug!(index = def.name, collection = %kind, "index ensured");
        }
        self.verify_indexes(kind).await
    }

    async fn verify_indexes(&self, kind: CollectionKind) -> Result<(), DatabaseError> {
        for def in indexes_for(kind) {
            let object_type = match def.kind {
                IndexKind::BTree(_) => "index",
                IndexKind::Text(_) => "table",
            };
            if !self.schema_object_exists(object_type, def.name).await? {
                return Err(unavailable(def.name, "missing after creation"));
            }
        }
        Ok(())
    }

    async fn schema_object_exists(&self, object_type: &str, name: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2",
                [object_type, name],
            )
            .await
            .map_err(|e| unavailable(name, e))?;
        Ok(rows.next().await.map_err(|e| unavailable(name, e))?.is_some())
    }
}

/// FTS5 external-content table plus the triggers that keep it in sync.
fn text_index_sql(fts: &str, table: &str, columns: &[TextColumn]) -> String {
    let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
    let cols = names.join(", ");
    let new_cols = names
        .iter()
        .map(|n| format!("new.{n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let old_cols = names
        .iter()
        .map(|n| format!("old.{n}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {fts} USING fts5(
            {cols},
            content='{table}',
            content_rowid='rowid',
            tokenize='porter unicode61'
        );
        CREATE TRIGGER IF NOT EXISTS {fts}_ai AFTER INSERT ON {table} BEGIN
            INSERT INTO {fts}(rowid, {cols}) VALUES (new.rowid, {new_cols});
        END;
        CREATE TRIGGER IF NOT EXISTS {fts}_ad AFTER DELETE ON {table} BEGIN
            INSERT INTO {fts}({fts}, rowid, {cols}) VALUES ('delete', old.rowid, {old_cols});
        END;
        CREATE TRIGGER IF NOT EXISTS {fts}_au AFTER UPDATE OF {cols} ON {table} BEGIN
            INSERT INTO {fts}({fts}, rowid, {cols}) VALUES ('delete', old.rowid, {old_cols});
            INSERT INTO {fts}(rowid, {cols}) VALUES (new.rowid, {new_cols});
        END;"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bm25_uses_declared_weights() {
        assert_eq!(
            bm25_expr(ISSUES_TEXT, ISSUE_TEXT_COLUMNS),
            "bm25(issues_fts, 10.0, 5.0, 1.0, 1.0, 1.0)"
        );
        assert_eq!(
            bm25_expr(ARTICLES_TEXT, ARTICLE_TEXT_COLUMNS),
            "bm25(articles_fts, 10.0, 5.0)"
        );
    }

    #[tokio::test]
    async fn ensure_indexes_is_idempotent() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        for kind in CollectionKind::ALL {
            assert!(db.require_indexes(kind).is_err());
            db.ensure_indexes(kind).await.unwrap();
            db.ensure_indexes(kind).await.unwrap();
            db.require_indexes(kind).unwrap();
            // A second creation pass on the same file is also harmless.
            db.create_indexes(kind).await.unwrap();
        }
    }

    #[tokio::test]
    async fn all_declared_indexes_exist() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        for kind in CollectionKind::ALL {
            db.ensure_indexes(kind).await.unwrap();
            for def in indexes_for(kind) {
                let object_type = match def.kind {
                    IndexKind::BTree(_) => "index",
                    IndexKind::Text(_) => "table",
                };
                assert!(
                    db.schema_object_exists(object_type, def.name).await.unwrap(),
                    "{} missing",
                    def.name
                );
                assert_eq!(def.collection, kind);
            }
        }
    }

    #[tokio::test]
    async fn missing_index_is_reported() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        let err = db.require_indexes(CollectionKind::MediaSources).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::IndexUnavailable { ref index, .. } if index == MEDIA_SOURCES_BY_PERSPECTIVE
        ));

        db.conn()
            .execute("DROP TABLE media_sources", ())
            .await
            .unwrap();
        let err = db
            .ensure_indexes(CollectionKind::MediaSources)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::IndexUnavailable { .. }));
        assert!(db.require_indexes(CollectionKind::MediaSources).is_err());
    }
}

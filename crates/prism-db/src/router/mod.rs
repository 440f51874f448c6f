//! Query router.
//!
//! Each supported access pattern is a typed request that compiles to one SQL
//! statement pinned to its index with `INDEXED BY` (or issued against its FTS5
//! table), so a missing or unusable index is an error rather than a silent
//! table scan.
//!
//! | Pattern                          | Index                                       | Order                          |
//! |----------------------------------|---------------------------------------------|--------------------------------|
//! | issues by category               | `idx_issues_category_created`               | `created_at DESC, id`          |
//! | issues newest / recently updated | `idx_issues_created` / `idx_issues_updated` | date `DESC`, `id`              |
//! | issue text search                | `issues_fts`                                | weighted bm25, `id`            |
//! | articles of an issue             | `idx_articles_issue_published`              | `published_at DESC, id`        |
//! | articles of an issue, one bucket | `idx_articles_issue_perspective_published`  | `published_at DESC, id`        |
//! | articles by source               | `idx_articles_source_published`             | `published_at DESC, id`        |
//! | articles newest                  | `idx_articles_published`                    | `published_at DESC, id`        |
//! | article text search              | `articles_fts`                              | weighted bm25, `id`            |
//! | media sources                    | `idx_media_sources_perspective_name`        | `perspective, name, id`        |
//!
//! Missing dates sort last. Date and media-source patterns page by keyset,
//! text searches by offset.

mod token;

use chrono::{DateTime, Utc};
use libsql::Value;
use prism_core::entities::{Article, Issue, MediaSource};
use prism_core::enums::{Bucket, Category, Perspective};
use serde::Serialize;

use crate::NewsDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, text};
use crate::indexes::{
    ARTICLE_TEXT_COLUMNS, ARTICLES_BY_ISSUE, ARTICLES_BY_ISSUE_PERSPECTIVE, ARTICLES_BY_PUBLISHED,
    ARTICLES_BY_SOURCE, ARTICLES_TEXT, ISSUE_TEXT_COLUMNS, ISSUES_BY_CATEGORY, ISSUES_BY_CREATED,
    ISSUES_BY_UPDATED, ISSUES_TEXT, MEDIA_SOURCES_BY_PERSPECTIVE, TextColumn, bm25_expr,
};
use crate::store::{ARTICLE_COLS, ISSUE_COLS, MEDIA_SOURCE_COLS};

pub use token::Position;

// ---------------------------------------------------------------------------
// Requests and pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Page size; clamped by the service's query configuration.
    pub limit: Option<u32>,
    /// Continuation token from the previous page of the same pattern.
    pub token: Option<String>,
}

impl PageRequest {
    #[must_use]
    pub const fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            token: None,
        }
    }

    #[must_use]
    pub fn after(limit: u32, token: impl Into<String>) -> Self {
        Self {
            limit: Some(limit),
            token: Some(token.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present when more results follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOrder {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueQuery {
    /// One category, newest first.
    ByCategory(Category),
    /// All issues by creation or last update, newest first.
    Recent(IssueOrder),
    /// Weighted text search over title, summary and the perspective summaries.
    Search(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleQuery {
    /// Articles of one issue, newest first, optionally one perspective bucket.
    ByIssue {
        issue_id: String,
        bucket: Option<Bucket>,
    },
    /// Articles from one media source, newest first.
    BySource(String),
    /// All articles, newest first.
    Recent,
    /// Weighted text search over title and summary.
    Search(String),
}

/// Media sources in scale order, then name; optionally a single perspective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaSourceQuery {
    pub perspective: Option<Perspective>,
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKey {
    IssueCreated,
    IssueUpdated,
    ArticlePublished,
}

impl DateKey {
    const fn column(self) -> &'static str {
        match self {
            Self::IssueCreated => "created_at",
            Self::IssueUpdated => "updated_at",
            Self::ArticlePublished => "published_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    DateDesc(DateKey),
    Source,
    Relevance { offset: u64 },
}

/// A routed query ready to execute.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
    /// Index (or FTS5 table) the statement is pinned to.
    pub index: &'static str,
    pattern: String,
    order: Order,
    limit: u32,
}

/// Sort-key access for building the next continuation token.
pub trait Keyed {
    fn key_id(&self) -> &str;

    fn date(&self, _key: DateKey) -> Option<DateTime<Utc>> {
        None
    }

    fn source_key(&self) -> Option<(Perspective, &str)> {
        None
    }
}

impl Keyed for Issue {
    fn key_id(&self) -> &str {
        &self.id
    }

    fn date(&self, key: DateKey) -> Option<DateTime<Utc>> {
        match key {
            DateKey::IssueCreated => Some(self.created_at),
            DateKey::IssueUpdated => self.updated_at,
            DateKey::ArticlePublished => None,
        }
    }
}

impl Keyed for Article {
    fn key_id(&self) -> &str {
        &self.id
    }

    fn date(&self, key: DateKey) -> Option<DateTime<Utc>> {
        match key {
            DateKey::ArticlePublished => self.published_at,
            DateKey::IssueCreated | DateKey::IssueUpdated => None,
        }
    }
}

impl Keyed for MediaSource {
    fn key_id(&self) -> &str {
        &self.id
    }

    fn source_key(&self) -> Option<(Perspective, &str)> {
        Some((self.perspective, &self.name))
    }
}

impl CompiledQuery {
    /// Trim the over-fetched row and derive the next token from the last
    /// returned item.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if an item lacks the sort key
    /// its pattern orders by.
    pub fn paginate<T: Keyed>(&self, mut items: Vec<T>) -> Result<Page<T>, DatabaseError> {
        let limit = self.limit as usize;
        if items.len() <= limit {
            return Ok(Page { items, next: None });
        }
        items.truncate(limit);
        let Some(last) = items.last() else {
            return Ok(Page { items, next: None });
        };

        let position = match self.order {
            Order::DateDesc(key) => Position::After {
                key: last.date(key).map(|d| format_datetime(&d)),
                id: last.key_id().to_string(),
            },
            Order::Source => {
                let (perspective, name) = last.source_key().ok_or_else(|| {
                    DatabaseError::InvalidState("item has no media source sort key".into())
                })?;
                Position::AfterSource {
                    rank: perspective.rank(),
                    name: name.to_string(),
                    id: last.key_id().to_string(),
                }
            }
            Order::Relevance { offset } => Position::Offset {
                offset: offset + u64::from(self.limit),
            },
        };
        let next = token::encode(&self.pattern, position)?;
        Ok(Page {
            items,
            next: Some(next),
        })
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

impl IssueQuery {
    /// The index this pattern is served from.
    #[must_use]
    pub const fn index(&self) -> &'static str {
        match self {
            Self::ByCategory(_) => ISSUES_BY_CATEGORY,
            Self::Recent(IssueOrder::Created) => ISSUES_BY_CREATED,
            Self::Recent(IssueOrder::Updated) => ISSUES_BY_UPDATED,
            Self::Search(_) => ISSUES_TEXT,
        }
    }

    fn pattern(&self) -> Result<String, DatabaseError> {
        Ok(match self {
            Self::ByCategory(category) => format!("issues.by_category:{category}"),
            Self::Recent(IssueOrder::Created) => "issues.recent:created".into(),
            Self::Recent(IssueOrder::Updated) => "issues.recent:updated".into(),
            Self::Search(q) => format!("issues.search:{}", match_expression(q)?),
        })
    }

    /// Compile to SQL for one page of `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidQuery` for an empty search or a token
    /// from another pattern.
    pub fn compile(&self, token: Option<&str>, limit: u32) -> Result<CompiledQuery, DatabaseError> {
        let pattern = self.pattern()?;
        let position = token.map(|t| token::decode(t, &pattern)).transpose()?;
        let table = Table {
            name: "issues",
            alias: "i",
            cols: ISSUE_COLS,
        };
        match self {
            Self::ByCategory(category) => date_desc(
                table,
                self.index(),
                DateKey::IssueCreated,
                vec![("i.category = ?".into(), vec![text(category.as_str())])],
                position,
                limit,
                pattern,
            ),
            Self::Recent(order) => date_desc(
                table,
                self.index(),
                match order {
                    IssueOrder::Created => DateKey::IssueCreated,
                    IssueOrder::Updated => DateKey::IssueUpdated,
                },
                Vec::new(),
                position,
                limit,
                pattern,
            ),
            Self::Search(q) => relevance(
                table,
                ISSUES_TEXT,
                ISSUE_TEXT_COLUMNS,
                &match_expression(q)?,
                position,
                limit,
                pattern,
            ),
        }
    }
}

impl ArticleQuery {
    /// The index this pattern is served from.
    #[must_use]
    pub const fn index(&self) -> &'static str {
        match self {
            Self::ByIssue { bucket: None, .. } => ARTICLES_BY_ISSUE,
            Self::ByIssue {
                bucket: Some(_), ..
            } => ARTICLES_BY_ISSUE_PERSPECTIVE,
            Self::BySource(_) => ARTICLES_BY_SOURCE,
            Self::Recent => ARTICLES_BY_PUBLISHED,
            Self::Search(_) => ARTICLES_TEXT,
        }
    }

    fn pattern(&self) -> Result<String, DatabaseError> {
        Ok(match self {
            Self::ByIssue { issue_id, bucket } => format!(
                "articles.by_issue:{issue_id}:{}",
                bucket.map_or("all", Bucket::as_str)
            ),
            Self::BySource(source_id) => format!("articles.by_source:{source_id}"),
            Self::Recent => "articles.recent".into(),
            Self::Search(q) => format!("articles.search:{}", match_expression(q)?),
        })
    }

    /// Compile to SQL for one page of `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidQuery` for an empty search or a token
    /// from another pattern.
    pub fn compile(&self, token: Option<&str>, limit: u32) -> Result<CompiledQuery, DatabaseError> {
        let pattern = self.pattern()?;
        let position = token.map(|t| token::decode(t, &pattern)).transpose()?;
        let table = Table {
            name: "articles",
            alias: "a",
            cols: ARTICLE_COLS,
        };
        let filters = match self {
            Self::ByIssue { issue_id, bucket } => {
                let mut filters = vec![("a.issue_id = ?".to_string(), vec![text(issue_id)])];
                if let Some(bucket) = bucket {
                    let (lo, hi) = bucket.rank_range();
                    filters.push((
                        "a.perspective BETWEEN ? AND ?".into(),
                        vec![Value::Integer(lo), Value::Integer(hi)],
                    ));
                }
                filters
            }
            Self::BySource(source_id) => {
                vec![("a.source_id = ?".to_string(), vec![text(source_id)])]
            }
            Self::Recent => Vec::new(),
            Self::Search(q) => {
                return relevance(
                    table,
                    ARTICLES_TEXT,
                    ARTICLE_TEXT_COLUMNS,
                    &match_expression(q)?,
                    position,
                    limit,
                    pattern,
                );
            }
        };
        date_desc(
            table,
            self.index(),
            DateKey::ArticlePublished,
            filters,
            position,
            limit,
            pattern,
        )
    }
}

impl MediaSourceQuery {
    #[must_use]
    pub const fn index(&self) -> &'static str {
        MEDIA_SOURCES_BY_PERSPECTIVE
    }

    /// Compile to SQL for one page of `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidQuery` for a token from another pattern.
    pub fn compile(&self, token: Option<&str>, limit: u32) -> Result<CompiledQuery, DatabaseError> {
        let pattern = format!(
            "media_sources:{}",
            self.perspective.map_or("all", Perspective::as_str)
        );
        let position = token.map(|t| token::decode(t, &pattern)).transpose()?;

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        if let Some(perspective) = self.perspective {
            conditions.push("m.perspective = ?".to_string());
            params.push(Value::Integer(perspective.rank()));
        }
        match position {
            None => {}
            Some(Position::AfterSource { rank, name, id }) => {
                conditions.push(
                    "(m.perspective > ? OR (m.perspective = ? AND (m.name > ? OR (m.name = ? AND m.id > ?))))"
                        .to_string(),
                );
                params.extend([
                    Value::Integer(rank),
                    Value::Integer(rank),
                    text(&name),
                    text(&name),
                    text(&id),
                ]);
            }
            Some(_) => return Err(wrong_position()),
        }
        params.push(Value::Integer(i64::from(limit) + 1));

        let sql = format!(
            "SELECT {MEDIA_SOURCE_COLS} FROM media_sources AS m INDEXED BY {index}
             WHERE {where_clause}
             ORDER BY m.perspective ASC, m.name ASC, m.id ASC
             LIMIT ?",
            index = self.index(),
            where_clause = where_clause(&conditions),
        );
        Ok(CompiledQuery {
            sql,
            params,
            index: self.index(),
            pattern,
            order: Order::Source,
            limit,
        })
    }
}

#[derive(Clone, Copy)]
struct Table {
    name: &'static str,
    alias: &'static str,
    cols: &'static str,
}

fn date_desc(
    table: Table,
    index: &'static str,
    key: DateKey,
    filters: Vec<(String, Vec<Value>)>,
    position: Option<Position>,
    limit: u32,
    pattern: String,
) -> Result<CompiledQuery, DatabaseError> {
    let Table { name, alias, cols } = table;
    let column = format!("{alias}.{}", key.column());
    let id = format!("{alias}.id");

    let mut conditions = Vec::new();
    let mut params = Vec::new();
    for (condition, values) in filters {
        conditions.push(condition);
        params.extend(values);
    }
    match position {
        None => {}
        Some(Position::After { key: Some(k), id: last }) => {
            conditions.push(format!(
                "({column} < ? OR ({column} = ? AND {id} > ?) OR {column} IS NULL)"
            ));
            params.extend([text(&k), text(&k), text(&last)]);
        }
        Some(Position::After { key: None, id: last }) => {
            conditions.push(format!("({column} IS NULL AND {id} > ?)"));
            params.push(text(&last));
        }
        Some(_) => return Err(wrong_position()),
    }
    params.push(Value::Integer(i64::from(limit) + 1));

    let sql = format!(
        "SELECT {cols} FROM {name} AS {alias} INDEXED BY {index}
         WHERE {where_clause}
         ORDER BY {column} DESC, {id} ASC
         LIMIT ?",
        where_clause = where_clause(&conditions),
    );
    Ok(CompiledQuery {
        sql,
        params,
        index,
        pattern,
        order: Order::DateDesc(key),
        limit,
    })
}

fn relevance(
    table: Table,
    fts: &'static str,
    columns: &[TextColumn],
    expression: &str,
    position: Option<Position>,
    limit: u32,
    pattern: String,
) -> Result<CompiledQuery, DatabaseError> {
    let offset = match position {
        None => 0,
        Some(Position::Offset { offset }) => offset,
        Some(_) => return Err(wrong_position()),
    };
    let Table { name, alias, cols } = table;
    let sql = format!(
        "SELECT {cols} FROM {fts}
         JOIN {name} AS {alias} ON {alias}.rowid = {fts}.rowid
         WHERE {fts} MATCH ?
         ORDER BY {score} ASC, {alias}.id ASC
         LIMIT ? OFFSET ?",
        score = bm25_expr(fts, columns),
    );
    Ok(CompiledQuery {
        sql,
        params: vec![
            text(expression),
            Value::Integer(i64::from(limit) + 1),
            Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)),
        ],
        index: fts,
        pattern,
        order: Order::Relevance { offset },
        limit,
    })
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        "1 = 1".to_string()
    } else {
        conditions.join(" AND ")
    }
}

fn wrong_position() -> DatabaseError {
    DatabaseError::InvalidQuery("continuation token does not fit this pattern".into())
}

/// Turn free text into an FTS5 expression: every alphanumeric run becomes a
/// quoted term, terms are OR-ed. Operators and punctuation never reach FTS5.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidQuery` if no term remains.
pub fn match_expression(input: &str) -> Result<String, DatabaseError> {
    let terms: Vec<String> = input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\""))
        .collect();
    if terms.is_empty() {
        return Err(DatabaseError::InvalidQuery(format!(
            "search text '{input}' has no searchable terms"
        )));
    }
    Ok(terms.join(" OR "))
}

impl NewsDb {
    /// `EXPLAIN QUERY PLAN` detail lines for a compiled query.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if planning fails, e.g. the pinned index is
    /// missing.
    pub async fn explain(&self, query: &CompiledQuery) -> Result<Vec<String>, DatabaseError> {
        crate::store::collect(
            self.conn(),
            &format!("EXPLAIN QUERY PLAN {}", query.sql),
            query.params.clone(),
            |row| Ok(row.get::<String>(3)?),
        )
        .await
    }
}

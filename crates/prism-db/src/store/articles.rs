use libsql::Value;
use prism_core::entities::{Article, EmbeddedSource, MediaSource};
use prism_core::enums::CollectionKind;

use crate::NewsDb;
use crate::aggregate::ArticleMember;
use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, is_unique_violation, narrow, opt_datetime, opt_text, parse_optional_datetime,
    parse_optional_enum, parse_perspective, parse_string_list, text, to_json_text,
};
use crate::router::CompiledQuery;
use crate::store::{collect, first};

pub const ARTICLE_COLS: &str = "a.id, a.title, a.url, a.content, a.preview, a.source_id, \
     a.source_name, a.perspective, a.summary, a.keywords, a.reporter, a.published_at, \
     a.issue_id, a.category, a.image_url, a.embedding";

fn row_to_article(row: &libsql::Row) -> Result<Article, DatabaseError> {
    let source_id: String = row.get(5)?;
    let source = match (get_opt_string(row, 6)?, row.get::<Option<i64>>(7)?) {
        (Some(name), Some(rank)) => Some(EmbeddedSource {
            id: source_id.clone(),
            name,
            perspective: parse_perspective(rank)?,
        }),
        _ => None,
    };
    let embedding = get_opt_string(row, 15)?
        .map(|s| {
            serde_json::from_str::<Vec<f64>>(&s)
                .map_err(|e| DatabaseError::Query(format!("Invalid embedding JSON: {e}")))
        })
        .transpose()?;

    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        content: row.get(3)?,
        preview: row.get(4)?,
        source_id,
        source,
        summary: get_opt_string(row, 8)?,
        keywords: parse_string_list(&row.get::<String>(9)?)?,
        reporter: get_opt_string(row, 10)?,
        published_at: parse_optional_datetime(get_opt_string(row, 11)?.as_deref())?,
        issue_id: get_opt_string(row, 12)?,
        category: parse_optional_enum(get_opt_string(row, 13)?.as_deref())?,
        image_url: get_opt_string(row, 14)?,
        embedding,
    })
}

/// Parameters for every column but `id`, in column order.
fn body_params(article: &Article) -> Result<Vec<Value>, DatabaseError> {
    let (source_name, perspective) = article.source.as_ref().map_or(
        (Value::Null, Value::Null),
        |s| (text(&s.name), Value::Integer(s.perspective.rank())),
    );
    let embedding = match &article.embedding {
        Some(v) => Value::Text(to_json_text(v)?),
        None => Value::Null,
    };
    Ok(vec![
        text(&article.title),
        text(&article.url),
        text(&article.content),
        text(&article.preview),
        text(&article.source_id),
        source_name,
        perspective,
        opt_text(article.summary.as_deref()),
        Value::Text(to_json_text(&article.keywords)?),
        opt_text(article.reporter.as_deref()),
        opt_datetime(article.published_at.as_ref()),
        opt_text(article.issue_id.as_deref()),
        opt_text(article.category.map(|c| c.as_str())),
        opt_text(article.image_url.as_deref()),
        embedding,
    ])
}

impl NewsDb {
    /// Insert an article. The embedded `source` copy is stored as given.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Duplicate` if the id is taken.
    pub async fn insert_article(&self, article: &Article) -> Result<(), DatabaseError> {
        let mut params = vec![text(&article.id)];
        params.extend(body_params(article)?);
        self.conn()
            .execute(
                "INSERT INTO articles (id, title, url, content, preview, source_id, source_name,
                    perspective, summary, keywords, reporter, published_at, issue_id, category,
                    image_url, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                libsql::params_from_iter(params),
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Duplicate {
                        collection: CollectionKind::Articles,
                        id: article.id.clone(),
                    }
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// Full replacement by id. Returns `false` if no article has this id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn update_article(&self, article: &Article) -> Result<bool, DatabaseError> {
        let mut params = body_params(article)?;
        params.push(text(&article.id));
        let changed = self
            .conn()
            .execute(
                "UPDATE articles SET title = ?1, url = ?2, content = ?3, preview = ?4,
                    source_id = ?5, source_name = ?6, perspective = ?7, summary = ?8,
                    keywords = ?9, reporter = ?10, published_at = ?11, issue_id = ?12,
                    category = ?13, image_url = ?14, embedding = ?15
                 WHERE id = ?16",
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(changed > 0)
    }

    /// Returns `false` if no article has this id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete_article(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute("DELETE FROM articles WHERE id = ?1", [id])
            .await?;
        Ok(changed > 0)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the row is unreadable.
    pub async fn find_article(&self, id: &str) -> Result<Option<Article>, DatabaseError> {
        first(
            self.conn(),
            &format!("SELECT {ARTICLE_COLS} FROM articles AS a WHERE a.id = ?1"),
            vec![text(id)],
            row_to_article,
        )
        .await
    }

    /// Execute a routed article query.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails (including an unusable
    /// pinned index).
    pub async fn find_articles(
        &self,
        query: &CompiledQuery,
    ) -> Result<Vec<Article>, DatabaseError> {
        collect(self.conn(), &query.sql, query.params.clone(), row_to_article).await
    }

    /// Number of articles whose `issueId` is `issue_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_issue_articles(&self, issue_id: &str) -> Result<u64, DatabaseError> {
        let count = first(
            self.conn(),
            "SELECT count(*) FROM articles WHERE issue_id = ?1",
            vec![text(issue_id)],
            |row| narrow::<u64>(row.get::<i64>(0)?, "count"),
        )
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Every article under an issue, joined to its live media source.
    ///
    /// `perspective` is `None` when the source no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is unreadable.
    pub async fn issue_members(&self, issue_id: &str) -> Result<Vec<ArticleMember>, DatabaseError> {
        collect(
            self.conn(),
            "SELECT a.id, a.source_id, a.keywords, m.perspective
             FROM articles AS a
             LEFT JOIN media_sources AS m ON m.id = a.source_id
             WHERE a.issue_id = ?1
             ORDER BY a.id",
            vec![text(issue_id)],
            |row| {
                Ok(ArticleMember {
                    article_id: row.get(0)?,
                    source_id: row.get(1)?,
                    keywords: parse_string_list(&row.get::<String>(2)?)?,
                    perspective: row
                        .get::<Option<i64>>(3)?
                        .map(parse_perspective)
                        .transpose()?,
                })
            },
        )
        .await
    }

    /// Distinct issue ids holding at least one article from `source_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn issues_citing_source(&self, source_id: &str) -> Result<Vec<String>, DatabaseError> {
        collect(
            self.conn(),
            "SELECT DISTINCT issue_id FROM articles
             WHERE source_id = ?1 AND issue_id IS NOT NULL
             ORDER BY issue_id",
            vec![text(source_id)],
            |row| Ok(row.get::<String>(0)?),
        )
        .await
    }

    /// Rewrite the embedded source copy on every article from `source`.
    /// Returns the number of articles touched.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn refresh_embedded_source(&self, source: &MediaSource) -> Result<u64, DatabaseError> {
        Ok(self
            .conn()
            .execute(
                "UPDATE articles SET source_name = ?2, perspective = ?3 WHERE source_id = ?1",
                libsql::params_from_iter(vec![
                    text(&source.id),
                    text(&source.name),
                    Value::Integer(source.perspective.rank()),
                ]),
            )
            .await?)
    }
}

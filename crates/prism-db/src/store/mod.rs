//! Document store adapter: per-collection CRUD on [`crate::NewsDb`].
//!
//! Each collection module defines its `SELECT` column list (always aliased:
//! `i` issues, `a` articles, `m` media sources), a row mapper, and an
//! `impl NewsDb` block. Nothing here validates; callers hand in documents
//! that already passed the schema validator.

mod articles;
mod issues;
mod media_sources;

pub use articles::ARTICLE_COLS;
pub use issues::ISSUE_COLS;
pub use media_sources::MEDIA_SOURCE_COLS;

use libsql::Value;

use crate::error::DatabaseError;

/// Run a query and map every row.
pub(crate) async fn collect<T>(
    conn: &libsql::Connection,
    sql: &str,
    params: Vec<Value>,
    map: impl Fn(&libsql::Row) -> Result<T, DatabaseError>,
) -> Result<Vec<T>, DatabaseError> {
    let mut rows = conn.query(sql, libsql::params_from_iter(params)).await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(map(&row)?);
    }
    Ok(out)
}

/// Run a query expected to return at most one row.
pub(crate) async fn first<T>(
    conn: &libsql::Connection,
    sql: &str,
    params: Vec<Value>,
    map: impl Fn(&libsql::Row) -> Result<T, DatabaseError>,
) -> Result<Option<T>, DatabaseError> {
    let mut rows = conn.query(sql, libsql::params_from_iter(params)).await?;
    rows.next().await?.as_ref().map(map).transpose()
}

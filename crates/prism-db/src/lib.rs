//! # prism-db
//!
//! libSQL-backed persistence for Prism's three collections.
//!
//! - [`NewsDb`] is the document store adapter: CRUD per collection, physical
//!   index ownership ([`NewsDb::ensure_indexes`]), and execution of compiled
//!   queries. It performs no validation.
//! - [`aggregate`] keeps each issue's coverage spectrum and per-bucket keyword
//!   lists in line with its live articles, serialized per issue.
//! - [`router`] maps each supported access pattern to a query pinned on its
//!   index, with stable ordering and continuation tokens.
//! - [`service::NewsService`] is the entry point tying validation, referential
//!   checks, storage, and aggregate maintenance together.

pub mod aggregate;
pub mod error;
pub mod helpers;
pub mod indexes;
pub mod locks;
mod migrations;
pub mod outcome;
pub mod retry;
pub mod router;
pub mod service;
pub mod store;

use std::path::Path;

use error::DatabaseError;
use indexes::IndexCells;
use libsql::Builder;

/// Central database handle.
///
/// Holds a single libSQL connection shared by every caller; statements on it
/// are serialized by `SQLite` itself.
pub struct NewsDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    indexes: IndexCells,
}

impl NewsDb {
    /// Open a local database at `path` (or `":memory:"`), creating parent
    /// directories as needed. Runs migrations; does not create indexes.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != prism_config::IN_MEMORY {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Other(anyhow::anyhow!(
                            "cannot create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let news_db = Self {
            db,
            conn,
            indexes: IndexCells::default(),
        };
        news_db.run_migrations().await?;
        Ok(news_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_local_creates_collections() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        for table in ["issues", "articles", "media_sources"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                )
                .await
                .unwrap();
            assert!(rows.next().await.unwrap().is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn spectrum_total_is_generated() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        db.conn()
            .execute(
                "INSERT INTO issues (id, title, summary, created_at, spectrum_left, spectrum_center, spectrum_right)
                 VALUES ('i', 't', 's', '2025-01-01T00:00:00.000000Z', 2, 3, 4)",
                (),
            )
            .await
            .unwrap();
        let mut rows = db
            .conn()
            .query("SELECT spectrum_total FROM issues WHERE id = 'i'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 9);
    }

    #[tokio::test]
    async fn reopening_a_file_database_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prism.db");
        let path = path.to_str().unwrap();
        {
            let db = NewsDb::open_local(path).await.unwrap();
            db.conn()
                .execute(
                    "INSERT INTO media_sources (id, name, perspective) VALUES ('m', 'M', 3)",
                    (),
                )
                .await
                .unwrap();
        }
        let db = NewsDb::open_local(path).await.unwrap();
        let mut rows = db
            .conn()
            .query("SELECT count(*) FROM media_sources", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }
}

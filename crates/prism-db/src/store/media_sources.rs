use libsql::Value;
use prism_core::entities::MediaSource;
use prism_core::enums::CollectionKind;

use crate::NewsDb;
use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, is_unique_violation, narrow, opt_datetime, opt_text, parse_optional_datetime,
    parse_perspective, text,
};
use crate::router::CompiledQuery;
use crate::store::{collect, first};

pub const MEDIA_SOURCE_COLS: &str = "m.id, m.name, m.perspective, m.description, m.website_url, \
     m.founded_year, m.ownership_info, m.created_at";

fn row_to_media_source(row: &libsql::Row) -> Result<MediaSource, DatabaseError> {
    Ok(MediaSource {
        id: row.get(0)?,
        name: row.get(1)?,
        perspective: parse_perspective(row.get::<i64>(2)?)?,
        description: get_opt_string(row, 3)?,
        website_url: get_opt_string(row, 4)?,
        founded_year: row
            .get::<Option<i64>>(5)?
            .map(|y| narrow(y, "founded_year"))
            .transpose()?,
        ownership_info: get_opt_string(row, 6)?,
        created_at: parse_optional_datetime(get_opt_string(row, 7)?.as_deref())?,
    })
}

fn body_params(source: &MediaSource) -> Vec<Value> {
    vec![
        text(&source.name),
        Value::Integer(source.perspective.rank()),
        opt_text(source.description.as_deref()),
        opt_text(source.website_url.as_deref()),
        source
            .founded_year
            .map_or(Value::Null, |y| Value::Integer(i64::from(y))),
        opt_text(source.ownership_info.as_deref()),
        opt_datetime(source.created_at.as_ref()),
    ]
}

impl NewsDb {
    /// # Errors
    ///
    /// Returns `DatabaseError::Duplicate` if the id is taken.
    pub async fn insert_media_source(&self, source: &MediaSource) -> Result<(), DatabaseError> {
        let mut params = vec![text(&source.id)];
        params.extend(body_params(source));
        self.conn()
            .execute(
                "INSERT INTO media_sources (id, name, perspective, description, website_url,
                    founded_year, ownership_info, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                libsql::params_from_iter(params),
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Duplicate {
                        collection: CollectionKind::MediaSources,
                        id: source.id.clone(),
                    }
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// Full replacement by id. Returns `false` if no source has this id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn update_media_source(&self, source: &MediaSource) -> Result<bool, DatabaseError> {
        let mut params = body_params(source);
        params.push(text(&source.id));
        let changed = self
            .conn()
            .execute(
                "UPDATE media_sources SET name = ?1, perspective = ?2, description = ?3,
                    website_url = ?4, founded_year = ?5, ownership_info = ?6, created_at = ?7
                 WHERE id = ?8",
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(changed > 0)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete_media_source(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute("DELETE FROM media_sources WHERE id = ?1", [id])
            .await?;
        Ok(changed > 0)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the row is unreadable.
    pub async fn find_media_source(&self, id: &str) -> Result<Option<MediaSource>, DatabaseError> {
        first(
            self.conn(),
            &format!("SELECT {MEDIA_SOURCE_COLS} FROM media_sources AS m WHERE m.id = ?1"),
            vec![text(id)],
            row_to_media_source,
        )
        .await
    }

    /// Execute a routed media source query.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails (including an unusable
    /// pinned index).
    pub async fn find_media_sources(
        &self,
        query: &CompiledQuery,
    ) -> Result<Vec<MediaSource>, DatabaseError> {
        collect(
            self.conn(),
            &query.sql,
            query.params.clone(),
            row_to_media_source,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prism_core::enums::Perspective;

    #[tokio::test]
    async fn insert_update_delete() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        let mut source = MediaSource {
            id: "src-1".into(),
            name: "Valley Post".into(),
            perspective: Perspective::FarLeft,
            description: Some("Regional weekly".into()),
            website_url: None,
            founded_year: Some(1888),
            ownership_info: None,
            created_at: None,
        };
        db.insert_media_source(&source).await.unwrap();
        assert_eq!(db.find_media_source("src-1").await.unwrap(), Some(source.clone()));

        source.perspective = Perspective::Center;
        assert!(db.update_media_source(&source).await.unwrap());
        assert_eq!(
            db.find_media_source("src-1").await.unwrap().unwrap().perspective,
            Perspective::Center
        );

        assert!(matches!(
            db.insert_media_source(&source).await,
            Err(DatabaseError::Duplicate { .. })
        ));
        assert!(db.delete_media_source("src-1").await.unwrap());
        assert!(!db.delete_media_source("src-1").await.unwrap());
        assert_eq!(db.find_media_source("src-1").await.unwrap(), None);
    }
}

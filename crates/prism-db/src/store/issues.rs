use libsql::Value;
use prism_core::entities::{CoverageSpectrum, Issue};
use prism_core::enums::CollectionKind;

use crate::NewsDb;
use crate::aggregate::IssueAggregate;
use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, is_unique_violation, narrow, opt_datetime, opt_text,
    parse_datetime, parse_optional_datetime, parse_optional_enum, parse_string_list, text,
    to_json_text,
};
use crate::router::CompiledQuery;
use crate::store::{collect, first};

pub const ISSUE_COLS: &str = "i.id, i.title, i.category, i.summary, i.image_url, i.keywords, \
     i.created_at, i.updated_at, i.left_summary, i.center_summary, i.right_summary, \
     i.bias_comparison, i.view, i.spectrum_left, i.spectrum_center, i.spectrum_right, \
     i.spectrum_total, i.left_keywords, i.center_keywords, i.right_keywords";

fn row_to_issue(row: &libsql::Row) -> Result<Issue, DatabaseError> {
    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        category: parse_optional_enum(get_opt_string(row, 2)?.as_deref())?,
        summary: row.get(3)?,
        image_url: get_opt_string(row, 4)?,
        keywords: parse_string_list(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_optional_datetime(get_opt_string(row, 7)?.as_deref())?,
        left_summary: get_opt_string(row, 8)?,
        center_summary: get_opt_string(row, 9)?,
        right_summary: get_opt_string(row, 10)?,
        bias_comparison: get_opt_string(row, 11)?,
        view: narrow(row.get::<i64>(12)?, "view")?,
        coverage_spectrum: CoverageSpectrum {
            left: narrow(row.get::<i64>(13)?, "spectrum_left")?,
            center: narrow(row.get::<i64>(14)?, "spectrum_center")?,
            right: narrow(row.get::<i64>(15)?, "spectrum_right")?,
            total: narrow(row.get::<i64>(16)?, "spectrum_total")?,
        },
        left_keywords: parse_string_list(&row.get::<String>(17)?)?,
        center_keywords: parse_string_list(&row.get::<String>(18)?)?,
        right_keywords: parse_string_list(&row.get::<String>(19)?)?,
    })
}

/// Parameters for the content (non-aggregate) columns, in column order.
fn content_params(issue: &Issue) -> Result<Vec<Value>, DatabaseError> {
    Ok(vec![
        text(&issue.title),
        opt_text(issue.category.map(|c| c.as_str())),
        text(&issue.summary),
        opt_text(issue.image_url.as_deref()),
        Value::Text(to_json_text(&issue.keywords)?),
        Value::Text(format_datetime(&issue.created_at)),
        opt_datetime(issue.updated_at.as_ref()),
        opt_text(issue.left_summary.as_deref()),
        opt_text(issue.center_summary.as_deref()),
        opt_text(issue.right_summary.as_deref()),
        opt_text(issue.bias_comparison.as_deref()),
    ])
}

impl NewsDb {
    /// Insert an issue, aggregates included as given.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Duplicate` if the id is taken.
    pub async fn insert_issue(&self, issue: &Issue) -> Result<(), DatabaseError> {
        let spectrum = &issue.coverage_spectrum;
        let mut params = vec![text(&issue.id)];
        params.extend(content_params(issue)?);
        params.extend([
            Value::Integer(i64::try_from(issue.view).unwrap_or(i64::MAX)),
            Value::Integer(i64::from(spectrum.left)),
            Value::Integer(i64::from(spectrum.center)),
            Value::Integer(i64::from(spectrum.right)),
            Value::Text(to_json_text(&issue.left_keywords)?),
            Value::Text(to_json_text(&issue.center_keywords)?),
            Value::Text(to_json_text(&issue.right_keywords)?),
        ]);

        self.conn()
            .execute(
                "INSERT INTO issues (id, title, category, summary, image_url, keywords, created_at,
                    updated_at, left_summary, center_summary, right_summary, bias_comparison,
                    view, spectrum_left, spectrum_center, spectrum_right,
                    left_keywords, center_keywords, right_keywords)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                libsql::params_from_iter(params),
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Duplicate {
                        collection: CollectionKind::Issues,
                        id: issue.id.clone(),
                    }
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// Replace an issue's content fields. `view`, the coverage spectrum and the
    /// per-bucket keyword lists are left untouched.
    ///
    /// Returns `false` if no issue has this id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn update_issue(&self, issue: &Issue) -> Result<bool, DatabaseError> {
        let mut params = content_params(issue)?;
        params.push(text(&issue.id));
        let changed = self
            .conn()
            .execute(
                "UPDATE issues SET title = ?1, category = ?2, summary = ?3, image_url = ?4,
                    keywords = ?5, created_at = ?6, updated_at = ?7, left_summary = ?8,
                    center_summary = ?9, right_summary = ?10, bias_comparison = ?11
                 WHERE id = ?12",
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(changed > 0)
    }

    /// Delete an issue only if no article references it.
    ///
    /// The reference check and the delete are one statement, so an article
    /// written concurrently cannot be orphaned between them.
    ///
    /// Returns `false` if nothing was deleted (missing or still referenced).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete_unreferenced_issue(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "DELETE FROM issues WHERE id = ?1
                   AND NOT EXISTS (SELECT 1 FROM articles WHERE issue_id = ?1)",
                [id],
            )
            .await?;
        Ok(changed > 0)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the row is unreadable.
    pub async fn find_issue(&self, id: &str) -> Result<Option<Issue>, DatabaseError> {
        first(
            self.conn(),
            &format!("SELECT {ISSUE_COLS} FROM issues AS i WHERE i.id = ?1"),
            vec![text(id)],
            row_to_issue,
        )
        .await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn issue_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT 1 FROM issues WHERE id = ?1", [id])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Execute a routed issue query.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails (including an unusable
    /// pinned index).
    pub async fn find_issues(&self, query: &CompiledQuery) -> Result<Vec<Issue>, DatabaseError> {
        collect(self.conn(), &query.sql, query.params.clone(), row_to_issue).await
    }

    /// Atomically add one to `view`; returns the new count, or `None` if the
    /// issue does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn increment_issue_view(&self, id: &str) -> Result<Option<u64>, DatabaseError> {
        first(
            self.conn(),
            "UPDATE issues SET view = view + 1 WHERE id = ?1 RETURNING view",
            vec![text(id)],
            |row| narrow(row.get::<i64>(0)?, "view"),
        )
        .await
    }

    /// Persist a recomputed aggregate in one statement.
    ///
    /// Returns `false` if the issue does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn write_issue_aggregate(
        &self,
        issue_id: &str,
        aggregate: &IssueAggregate,
    ) -> Result<bool, DatabaseError> {
        let spectrum = &aggregate.spectrum;
        let params = vec![
            Value::Integer(i64::from(spectrum.left)),
            Value::Integer(i64::from(spectrum.center)),
            Value::Integer(i64::from(spectrum.right)),
            Value::Text(to_json_text(&aggregate.left_keywords)?),
            Value::Text(to_json_text(&aggregate.center_keywords)?),
            Value::Text(to_json_text(&aggregate.right_keywords)?),
            text(issue_id),
        ];
        let changed = self
            .conn()
            .execute(
                "UPDATE issues SET spectrum_left = ?1, spectrum_center = ?2, spectrum_right = ?3,
                    left_keywords = ?4, center_keywords = ?5, right_keywords = ?6
                 WHERE id = ?7",
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn issue(id: &str) -> Issue {
        Issue {
            id: id.into(),
            title: "Energy tariffs".into(),
            category: None,
            summary: "Tariffs rise in winter.".into(),
            image_url: None,
            keywords: vec!["energy".into()],
            created_at: Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap(),
            updated_at: None,
            left_summary: Some(String::new()),
            center_summary: None,
            right_summary: None,
            bias_comparison: None,
            view: 0,
            coverage_spectrum: CoverageSpectrum::default(),
            left_keywords: vec![],
            center_keywords: vec![],
            right_keywords: vec![],
        }
    }

    #[tokio::test]
    async fn insert_find_roundtrip() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        let original = issue("iss-1");
        db.insert_issue(&original).await.unwrap();
        assert_eq!(db.find_issue("iss-1").await.unwrap(), Some(original));
        assert_eq!(db.find_issue("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_is_reported() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        db.insert_issue(&issue("iss-1")).await.unwrap();
        let err = db.insert_issue(&issue("iss-1")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { .. }), "{err}");
    }

    #[tokio::test]
    async fn update_leaves_aggregates_alone() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        db.insert_issue(&issue("iss-1")).await.unwrap();
        let aggregate = IssueAggregate {
            spectrum: CoverageSpectrum::from_counts(1, 2, 0),
            left_keywords: vec!["a".into()],
            center_keywords: vec!["b".into()],
            right_keywords: vec![],
        };
        assert!(db.write_issue_aggregate("iss-1", &aggregate).await.unwrap());
        assert_eq!(db.increment_issue_view("iss-1").await.unwrap(), Some(1));

        let mut edited = issue("iss-1");
        edited.title = "Energy tariffs, revised".into();
        assert!(db.update_issue(&edited).await.unwrap());

        let stored = db.find_issue("iss-1").await.unwrap().unwrap();
        assert_eq!(stored.title, "Energy tariffs, revised");
        assert_eq!(stored.coverage_spectrum, CoverageSpectrum::from_counts(1, 2, 0));
        assert_eq!(stored.left_keywords, vec!["a"]);
        assert_eq!(stored.view, 1);
    }

    #[tokio::test]
    async fn view_increment_on_missing_issue() {
        let db = NewsDb::open_local(":memory:").await.unwrap();
        assert_eq!(db.increment_issue_view("ghost").await.unwrap(), None);
        assert!(!db.update_issue(&issue("ghost")).await.unwrap());
        assert!(!db.delete_unreferenced_issue("ghost").await.unwrap());
    }
}

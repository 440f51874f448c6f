//! Shared fixtures for prism-db integration tests.

#![allow(dead_code)]

use prism_config::PrismConfig;
use prism_db::NewsDb;
use prism_db::service::NewsService;
use serde_json::{Value, json};

/// In-memory service with every index ensured.
pub async fn test_service() -> NewsService {
    let db = NewsDb::open_local(":memory:").await.unwrap();
    let svc = NewsService::new(db, &PrismConfig::default());
    svc.ensure_all_indexes().await.unwrap();
    svc
}

pub fn issue(id: &str, title: &str, category: &str, created_at: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "category": category,
        "summary": format!("Summary of {title}"),
        "createdAt": created_at,
    })
}

pub fn media_source(id: &str, name: &str, perspective: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "perspective": perspective,
    })
}

pub fn article(id: &str, issue_id: &str, source_id: &str) -> Value {
    json!({
        "_id": id,
        "title": format!("Report {id}"),
        "url": format!("https://news.example/{id}"),
        "content": "Full text.",
        "preview": "Full text",
        "sourceId": source_id,
        "issueId": issue_id,
    })
}

/// `article` with a publication date.
pub fn dated_article(id: &str, issue_id: &str, source_id: &str, published_at: &str) -> Value {
    let mut value = article(id, issue_id, source_id);
    value["publishedAt"] = json!(published_at);
    value
}

/// One source per perspective, ids `src-<perspective>`.
pub async fn seed_sources(svc: &NewsService) {
    for perspective in [
        "far_left",
        "left",
        "center_left",
        "center",
        "center_right",
        "right",
        "far_right",
    ] {
        svc.insert_media_source(&media_source(
            &format!("src-{perspective}"),
            &format!("{perspective} daily"),
            perspective,
        ))
        .await
        .unwrap();
    }
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Category, Perspective};

/// Denormalized copy of a media source's identity, embedded in each article.
///
/// Written by the article write path from the live `MediaSource` record and
/// refreshed when that record's name or perspective changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EmbeddedSource {
    #[serde(rename = "_id")]
    #[schemars(length(min = 1))]
    pub id: String,
    #[schemars(length(min = 1, max = 50))]
    pub name: String,
    pub perspective: Perspective,
}

/// A single news article from one media source.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Article {
    #[serde(rename = "_id")]
    #[schemars(length(min = 1))]
    pub id: String,
    #[schemars(length(min = 1, max = 300))]
    pub title: String,
    pub url: String,
    pub content: String,
    #[schemars(length(min = 1, max = 1000))]
    pub preview: String,
    #[schemars(length(min = 1))]
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EmbeddedSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 500))]
    pub summary: Option<String>,
    #[serde(default)]
    #[schemars(inner(length(min = 1, max = 50)))]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(min = 1, max = 50))]
    pub reporter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(min = 1))]
    pub issue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Opaque similarity vector; its producer and dimension live outside this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Perspective;

/// A news outlet and its political leaning. Master record, no back-pointers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MediaSource {
    #[serde(rename = "_id")]
    #[schemars(length(min = 1))]
    pub id: String,
    #[schemars(length(min = 1, max = 50))]
    pub name: String,
    pub perspective: Perspective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 500))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1800, max = 2025))]
    pub founded_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 200))]
    pub ownership_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MediaSource {
    /// Identity fields copied into every article from this source.
    #[must_use]
    pub fn embedded(&self) -> crate::entities::EmbeddedSource {
        crate::entities::EmbeddedSource {
            id: self.id.clone(),
            name: self.name.clone(),
            perspective: self.perspective,
        }
    }
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Bucket, Category};

/// Per-issue count of stored articles bucketed by source perspective.
///
/// `total` is always `left + center + right`; construct through
/// [`CoverageSpectrum::from_counts`] to keep it that way.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CoverageSpectrum {
    pub left: u32,
    pub center: u32,
    pub right: u32,
    pub total: u32,
}

impl CoverageSpectrum {
    #[must_use]
    pub const fn from_counts(left: u32, center: u32, right: u32) -> Self {
        Self {
            left,
            center,
            right,
            total: left + center + right,
        }
    }

    #[must_use]
    pub const fn count(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::Left => self.left,
            Bucket::Center => self.center,
            Bucket::Right => self.right,
        }
    }

    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.total == self.left + self.center + self.right
    }
}

/// A news issue grouping articles from across the political spectrum.
///
/// `view`, `coverage_spectrum` and the three per-bucket keyword lists are
/// cached aggregates owned by the store; values supplied by callers are
/// ignored on write.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Issue {
    #[serde(rename = "_id")]
    #[schemars(length(min = 1))]
    pub id: String,
    #[schemars(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[schemars(length(min = 1, max = 500))]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    #[schemars(inner(length(min = 1, max = 50)))]
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 500))]
    pub left_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 500))]
    pub center_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 500))]
    pub right_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 500))]
    pub bias_comparison: Option<String>,
    #[serde(default)]
    pub view: u64,
    #[serde(default)]
    pub coverage_spectrum: CoverageSpectrum,
    #[serde(default)]
    #[schemars(inner(length(min = 1, max = 50)))]
    pub left_keywords: Vec<String>,
    #[serde(default)]
    #[schemars(inner(length(min = 1, max = 50)))]
    pub center_keywords: Vec<String>,
    #[serde(default)]
    #[schemars(inner(length(min = 1, max = 50)))]
    pub right_keywords: Vec<String>,
}

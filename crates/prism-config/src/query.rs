//! Page sizing for list and search queries.

use serde::{Deserialize, Serialize};

const fn default_page_size() -> u32 {
    20
}

const fn default_max_page_size() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Page size used when a request does not name one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Requested page sizes are clamped to this.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl QueryConfig {
    /// Effective page size for a request.
    #[must_use]
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        let config = QueryConfig::default();
        assert_eq!(config.page_size(None), 20);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(5)), 5);
        assert_eq!(config.page_size(Some(10_000)), 100);
    }
}

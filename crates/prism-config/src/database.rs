//! Storage location.

use serde::{Deserialize, Serialize};

/// Path handed to libSQL when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = ".prism/prism.db";

/// Special path for a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

fn default_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Local database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

//! Database location.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    "raceday.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// libSQL database file, or `:memory:` for a throwaway database.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// Path of the database file; `None` for in-memory databases.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        (!self.is_in_memory()).then(|| PathBuf::from(&self.path))
    }
}

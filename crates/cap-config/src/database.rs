//! Local libSQL database configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".captrack/captrack.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the database file. `:memory:` keeps everything in process.
    #[serde(default = "default_path")]
    pub path: String,

    /// Directory for the per-period JSONL revision trail. Empty disables the trail.
    #[serde(default)]
    pub trail_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            trail_dir: String::new(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.path.trim().is_empty()
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// Trail directory, if the trail is enabled.
    #[must_use]
    pub fn trail_path(&self) -> Option<PathBuf> {
        let dir = self.trail_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}

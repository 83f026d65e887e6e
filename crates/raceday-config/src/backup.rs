//! Backup export, restore, and daily auto-backup settings.

use std::path::PathBuf;
use std::time::Duration;

use raceday_core::backup::{BACKUP_FORMAT_VERSION, DEFAULT_SOURCE};
use serde::{Deserialize, Serialize};

fn default_dir() -> String {
    "backups/daily".to_string()
}

const fn default_retention() -> usize {
    30
}

const fn default_replace_timeout_secs() -> u64 {
    60
}

const fn default_merge_timeout_secs() -> u64 {
    20
}

fn default_format_version() -> String {
    BACKUP_FORMAT_VERSION.to_string()
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupConfig {
    /// Directory holding `backup-YYYY-MM-DD.json` files.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Number of daily files kept after pruning.
    #[serde(default = "default_retention")]
    pub retention: usize,

    /// Transaction timeout for a replacing restore.
    #[serde(default = "default_replace_timeout_secs")]
    pub replace_timeout_secs: u64,

    /// Transaction timeout for a merging restore.
    #[serde(default = "default_merge_timeout_secs")]
    pub merge_timeout_secs: u64,

    /// Version written into exported metadata.
    #[serde(default = "default_format_version")]
    pub format_version: String,

    /// Producer name written into exported metadata.
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            retention: default_retention(),
            replace_timeout_secs: default_replace_timeout_secs(),
            merge_timeout_secs: default_merge_timeout_secs(),
            format_version: default_format_version(),
            source: default_source(),
        }
    }
}

impl BackupConfig {
    #[must_use]
    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }

    #[must_use]
    pub const fn replace_timeout(&self) -> Duration {
        Duration::from_secs(self.replace_timeout_secs)
    }

    #[must_use]
    pub const fn merge_timeout(&self) -> Duration {
        Duration::from_secs(self.merge_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = BackupConfig::default();
        assert_eq!(config.dir, "backups/daily");
        assert_eq!(config.retention, 30);
        assert_eq!(config.replace_timeout(), Duration::from_secs(60));
        assert_eq!(config.merge_timeout(), Duration::from_secs(20));
        assert_eq!(config.format_version, "2.0");
    }
}

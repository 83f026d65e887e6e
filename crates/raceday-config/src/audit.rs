//! Audit log read limits.

use serde::{Deserialize, Serialize};

const fn default_max_rows() -> usize {
    100
}

const fn default_limit() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Hard cap on rows returned by any audit read.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Page size used when the caller does not pass a limit.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            default_limit: default_limit(),
        }
    }
}

impl AuditConfig {
    /// Resolve a requested page size against the default and the cap.
    #[must_use]
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .min(self.max_rows)
    }
}

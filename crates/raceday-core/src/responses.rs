//! Structured results returned across the action boundary.
//!
//! Admin actions never let an error escape to the caller as a panic or a
//! bare error string: they return one of these shapes, which the CLI prints
//! as JSON.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tables::Table;

/// Envelope for every user-facing action: `{success, message|error, warnings}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionResult {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            warnings: Vec::new(),
            data: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            warnings: Vec::new(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Convert an operation outcome, logging failures with the operation name.
    ///
    /// On success the payload is serialized into `data` and its `Display`
    /// form becomes the message. On failure the error text is returned as
    /// `error`, prefixed with the operation name.
    pub fn from_result<T, E>(operation: &str, result: Result<T, E>) -> Self
    where
        T: Serialize + fmt::Display,
        E: fmt::Display,
    {
        match result {
            Ok(value) => {
                let message = value.to_string();
                match serde_json::to_value(&value) {
                    Ok(data) => Self::ok(message).with_data(data),
                    Err(e) => Self::ok(message).with_warnings(vec![format!(
                        "result payload could not be serialized: {e}"
                    )]),
                }
            }
            Err(error) => {
                tracing::error!(operation, timestamp = %chrono::Utc::now().to_rfc3339(), %error, "action failed");
                Self::failed(format!("{operation} failed: {error}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

/// Which restore policy ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// Wipe every managed table, then bulk insert the document.
    Replace,
    /// Upsert every row by id; never deletes.
    Merge,
}

impl RestorePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for RestorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-table counters for a restore run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TableRestoreStats {
    pub table: Table,
    pub deleted: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl TableRestoreStats {
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self {
            table,
            deleted: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RestoreReport {
    pub policy: RestorePolicy,
    pub tables: Vec<TableRestoreStats>,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl RestoreReport {
    #[must_use]
    pub const fn new(policy: RestorePolicy) -> Self {
        Self {
            policy,
            tables: Vec::new(),
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Counters for one table, created on first use.
    pub fn stats_mut(&mut self, table: Table) -> &mut TableRestoreStats {
        if let Some(pos) = self.tables.iter().position(|s| s.table == table) {
            &mut self.tables[pos]
        } else {
            self.tables.push(TableRestoreStats::new(table));
            let last = self.tables.len() - 1;
            &mut self.tables[last]
        }
    }

    #[must_use]
    pub fn stats(&self, table: Table) -> Option<&TableRestoreStats> {
        self.tables.iter().find(|s| s.table == table)
    }

    #[must_use]
    pub fn total_written(&self) -> u64 {
        self.tables.iter().map(|s| s.inserted + s.updated).sum()
    }

    #[must_use]
    pub fn total_skipped(&self) -> u64 {
        self.tables.iter().map(|s| s.skipped).sum()
    }
}

impl fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} restore wrote {} rows across {} tables ({} skipped, {} warnings)",
            self.policy,
            self.total_written(),
            self.tables.len(),
            self.total_skipped(),
            self.warnings.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Auto-backup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AutoBackupStatus {
    /// Caller is not an admin; nothing was checked or written.
    Skipped,
    /// Today's file already exists.
    Exists { file: String },
    /// A new file was written and retention applied.
    Created {
        file: String,
        pruned: Vec<String>,
        warnings: Vec<String>,
    },
}

impl fmt::Display for AutoBackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("auto-backup skipped (admin role required)"),
            Self::Exists { file } => write!(f, "today's backup already exists: {file}"),
            Self::Created { file, pruned, .. } => {
                write!(f, "created {file} (pruned {} old backups)", pruned.len())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Outcome of a payment-status CSV import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImportReport {
    pub updated: u64,
    /// Rows whose update failed in the store (including unknown ids).
    pub db_errors: u64,
    /// Rows that could not be parsed (too few columns, empty id).
    pub skipped_rows: u64,
    /// Rows whose status text matched no synonym.
    pub unknown_status: u64,
    /// Delimiter detected from the header.
    pub delimiter: String,
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} records updated", self.updated)];
        if self.db_errors > 0 {
            parts.push(format!("{} database errors", self.db_errors));
        }
        let unparsed = self.skipped_rows + self.unknown_status;
        if unparsed > 0 {
            parts.push(format!("{unparsed} rows skipped"));
        }
        parts.join(", ")
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// A rendered CSV download.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content_type: String,
    pub rows: usize,
    pub body: String,
}

impl fmt::Display for CsvExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} registrations)", self.filename, self.rows)
    }
}

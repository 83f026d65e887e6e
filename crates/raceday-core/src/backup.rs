//! Backup document envelope.
//!
//! A backup is one JSON document: `{ "metadata": {...}, "data": { "<table>": [rows] } }`.
//! Documents written by older tooling may name the producer `generator`
//! instead of `source`, and may nest relation arrays inside parent rows;
//! both shapes deserialize into the same envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::tables::Table;

/// Format version written into new documents.
pub const BACKUP_FORMAT_VERSION: &str = "2.0";

/// Highest major format version the restorer understands.
pub const SUPPORTED_MAJOR_VERSION: u32 = 2;

/// Default producer name recorded in metadata.
pub const DEFAULT_SOURCE: &str = "raceday";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    /// Point in time the tables were read.
    pub timestamp: DateTime<Utc>,

    pub version: String,

    /// Producer of the document.
    #[serde(alias = "generator", default = "default_source")]
    pub source: String,

    /// Tables exported, in export order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,

    /// Whether child rows are nested under their parents.
    #[serde(default)]
    pub embedded_relations: bool,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl BackupMetadata {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, version: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            timestamp,
            version: version.into(),
            source: source.into(),
            tables: Vec::new(),
            embedded_relations: false,
        }
    }

    /// Major component of `version` (`"2.0"` → 2, `"1"` → 1).
    #[must_use]
    pub fn major_version(&self) -> Option<u32> {
        self.version
            .trim()
            .trim_start_matches('v')
            .split('.')
            .next()
            .and_then(|major| major.parse().ok())
    }
}

/// Full snapshot of selected tables plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BackupDocument {
    pub metadata: BackupMetadata,

    /// Rows per table key. Keys that are not managed tables are kept so the
    /// restorer can report them.
    #[serde(default)]
    pub data: BTreeMap<String, Vec<Record>>,
}

impl BackupDocument {
    #[must_use]
    pub const fn new(metadata: BackupMetadata) -> Self {
        Self {
            metadata,
            data: BTreeMap::new(),
        }
    }

    /// Rows stored under a table's key (empty when absent).
    #[must_use]
    pub fn rows(&self, table: Table) -> &[Record] {
        self.data.get(table.as_str()).map_or(&[], Vec::as_slice)
    }

    pub fn set_rows(&mut self, table: Table, rows: Vec<Record>) {
        self.data.insert(table.as_str().to_string(), rows);
    }

    /// Total top-level rows across all tables.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }
}

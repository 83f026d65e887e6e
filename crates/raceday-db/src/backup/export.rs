//! Backup export.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use futures::future::try_join_all;
use raceday_core::backup::{BackupDocument, BackupMetadata};
use raceday_core::identity::Actor;
use raceday_core::record::{Filter, Record, record_id};
use raceday_core::tables::{EMBEDDINGS, Embedding, Table};
use serde_json::Value;

use super::{BackupWritten, write_document};
use crate::error::AdminError;
use crate::service::{AdminService, require_admin};
use crate::store::{EntityStore, UnitOfWork};

/// Which tables to export and in which shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub tables: Vec<Table>,
    /// Nest child rows under their parents (`events[].distances[].priceTiers[]`,
    /// `orders[].items[]`) instead of listing them at the top level.
    pub embed_relations: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tables: Table::RESTORE_ORDER.to_vec(),
            embed_relations: false,
        }
    }
}

impl ExportOptions {
    #[must_use]
    pub fn embedded() -> Self {
        Self {
            embed_relations: true,
            ..Self::default()
        }
    }
}

/// Move child rows into a nested array on their parent row.
///
/// Children whose parent is not in the export stay at the top level so no
/// row is lost.
fn embed(tables: &mut BTreeMap<Table, Vec<Record>>, embedding: &Embedding) {
    if !tables.contains_key(&embedding.parent) {
        return;
    }
    let Some(children) = tables.remove(&embedding.child) else {
        return;
    };

    let mut by_parent: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    let mut orphans = Vec::new();
    let parent_ids: Vec<String> = tables
        .get(&embedding.parent)
        .into_iter()
        .flatten()
        .filter_map(|row| record_id(row).map(str::to_string))
        .collect();

    for child in children {
        match child.get(embedding.foreign_key).and_then(Value::as_str) {
            Some(parent) if parent_ids.iter().any(|id| id == parent) => {
                by_parent
                    .entry(parent.to_string())
                    .or_default()
                    .push(Value::Object(child));
            }
            _ => orphans.push(child),
        }
    }

    if let Some(parents) = tables.get_mut(&embedding.parent) {
        for parent in parents {
            let nested = record_id(parent)
                .and_then(|id| by_parent.remove(id))
                .unwrap_or_default();
            parent.insert(embedding.key.to_string(), Value::Array(nested));
        }
    }
    if !orphans.is_empty() {
        tracing::debug!(
            table = %embedding.child,
            count = orphans.len(),
            "rows without an exported parent stay at the top level"
        );
        tables.insert(embedding.child, orphans);
    }
}

impl<S: EntityStore> AdminService<S> {
    /// Read the selected tables into one document.
    ///
    /// Tables are read concurrently; this is a point-in-time read with no
    /// ordering constraint. Any failed read aborts the whole export.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Validation` when a table that is
    /// never backed up is requested, or the first store error.
    pub async fn create_backup(
        &self,
        actor: &Actor,
        options: &ExportOptions,
    ) -> Result<BackupDocument, AdminError> {
        require_admin(actor, "backup export")?;
        if let Some(table) = options.tables.iter().find(|t| !t.is_backed_up()) {
            return Err(AdminError::Validation(format!("{table} is not part of backups")));
        }

        let mut selected = options.tables.clone();
        selected.sort_by_key(|t| Table::RESTORE_ORDER.iter().position(|o| o == t));
        selected.dedup();

        let all = Filter::all();
        let reads = selected.iter().map(|table| {
            let all = &all;
            async move {
                let rows = self.store().find(*table, all).await?;
                Ok::<_, AdminError>((*table, rows))
            }
        });
        let mut tables: BTreeMap<Table, Vec<Record>> = try_join_all(reads).await?.into_iter().collect();

        if options.embed_relations {
            for embedding in EMBEDDINGS.iter().rev() {
                embed(&mut tables, embedding);
            }
        }

        let backup = &self.config().backup;
        let mut metadata = BackupMetadata::new(Utc::now(), &backup.format_version, &backup.source);
        metadata.tables.clone_from(&selected);
        metadata.embedded_relations = options.embed_relations;

        let mut document = BackupDocument::new(metadata);
        for (table, rows) in tables {
            document.set_rows(table, rows);
        }
        tracing::info!(
            actor = %actor.id,
            tables = selected.len(),
            rows = document.row_count(),
            embedded = options.embed_relations,
            "backup created"
        );
        Ok(document)
    }

    /// Create a backup and write it to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_backup`], plus I/O failures. Nothing is written
    /// when the export fails.
    pub async fn export_to_file(
        &self,
        actor: &Actor,
        path: &Path,
        options: &ExportOptions,
    ) -> Result<BackupWritten, AdminError> {
        let document = self.create_backup(actor, options).await?;
        write_document(path, &document).await
    }
}

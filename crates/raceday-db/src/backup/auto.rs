//! Daily auto-backup.
//!
//! The first admin request of a calendar day writes `backup-YYYY-MM-DD.json`
//! into `backup.dir`; later calls that day see the file and return. After a
//! write, files beyond `backup.retention` are deleted oldest first.
//!
//! Two concurrent first calls may both write the same path. The last writer
//! wins and the content is equivalent, so no lock is taken.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use raceday_core::identity::Actor;
use raceday_core::responses::AutoBackupStatus;

use super::export::ExportOptions;
use super::write_document;
use crate::error::AdminError;
use crate::service::AdminService;
use crate::store::EntityStore;

const PREFIX: &str = "backup-";
const SUFFIX: &str = ".json";

/// File name of the auto-backup for `date`.
#[must_use]
pub fn auto_backup_name(date: NaiveDate) -> String {
    format!("{PREFIX}{}{SUFFIX}", date.format("%Y-%m-%d"))
}

/// Whether `name` is an auto-backup file name. Other files in the directory
/// are never listed or pruned.
#[must_use]
pub fn is_auto_backup_name(name: &str) -> bool {
    name.strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_suffix(SUFFIX))
        .is_some_and(|date| date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok())
}

/// Auto-backup file names in `dir`, oldest first.
async fn auto_backup_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str().filter(|n| is_auto_backup_name(n)) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Keep the `keep` newest auto-backups in `dir`, deleting the rest one at a
/// time.
///
/// Never fails: returns the deleted names and a warning per file (or
/// directory listing) that could not be handled.
pub async fn prune_backups(dir: &Path, keep: usize) -> (Vec<String>, Vec<String>) {
    let mut deleted = Vec::new();
    let mut warnings = Vec::new();

    let names = match auto_backup_names(dir).await {
        Ok(names) => names,
        Err(error) => {
            tracing::warn!(dir = %dir.display(), %error, "cannot list backups for pruning");
            warnings.push(format!("cannot list {}: {error}", dir.display()));
            return (deleted, warnings);
        }
    };

    let excess = names.len().saturating_sub(keep);
    for name in names.into_iter().take(excess) {
        match tokio::fs::remove_file(dir.join(&name)).await {
            Ok(()) => {
                tracing::debug!(file = %name, "old backup pruned");
                deleted.push(name);
            }
            Err(error) => {
                tracing::warn!(file = %name, %error, "failed to prune old backup");
                warnings.push(format!("failed to delete {name}: {error}"));
            }
        }
    }
    (deleted, warnings)
}

impl<S: EntityStore> AdminService<S> {
    /// Make sure today's auto-backup exists.
    ///
    /// Non-admin callers get `Skipped` without any check. `now` decides the
    /// calendar day (UTC).
    ///
    /// # Errors
    ///
    /// Export or write failures. Pruning problems are warnings on `Created`.
    pub async fn check_and_create_auto_backup(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<AutoBackupStatus, AdminError> {
        if !actor.is_admin() {
            tracing::debug!(actor = %actor.id, "auto-backup skipped for non-admin");
            return Ok(AutoBackupStatus::Skipped);
        }

        let config = &self.config().backup;
        let dir = config.dir_path();
        let file = auto_backup_name(now.date_naive());
        let path = dir.join(&file);

        if tokio::fs::try_exists(&path).await? {
            return Ok(AutoBackupStatus::Exists { file });
        }

        let document = self.create_backup(actor, &ExportOptions::default()).await?;
        write_document(&path, &document).await?;
        let (pruned, warnings) = prune_backups(&dir, config.retention).await;

        tracing::info!(
            file = %file,
            rows = document.row_count(),
            pruned = pruned.len(),
            "auto-backup created"
        );
        Ok(AutoBackupStatus::Created {
            file,
            pruned,
            warnings,
        })
    }

    /// Auto-backup file names, newest first. Empty when the directory is missing.
    ///
    /// # Errors
    ///
    /// I/O failures other than a missing directory.
    pub async fn list_auto_backups(&self) -> Result<Vec<String>, AdminError> {
        let dir = self.config().backup.dir_path();
        match auto_backup_names(&dir).await {
            Ok(mut names) => {
                names.reverse();
                Ok(names)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }
}

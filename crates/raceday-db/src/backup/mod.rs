//! Backup export, restore, and daily auto-backups.
//!
//! - [`export`]: read the backed-up tables into a [`BackupDocument`]
//! - [`normalize`]: turn any accepted document shape into flat, projected rows
//! - [`restore`]: replace or merge a document into the store inside one transaction
//! - [`auto`]: the once-a-day snapshot with retention pruning
//!
//! Documents on disk are pretty-printed UTF-8 JSON.

pub mod auto;
pub mod export;
pub mod normalize;
pub mod restore;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use raceday_core::backup::BackupDocument;
use serde::Serialize;

use crate::error::AdminError;

pub use auto::{auto_backup_name, is_auto_backup_name, prune_backups};
pub use export::ExportOptions;
pub use normalize::{Normalized, normalize_document};

/// A document persisted to disk.
#[derive(Debug, Clone, Serialize)]
pub struct BackupWritten {
    pub path: PathBuf,
    pub tables: usize,
    pub rows: usize,
}

impl fmt::Display for BackupWritten {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} rows from {} tables to {}",
            self.rows,
            self.tables,
            self.path.display()
        )
    }
}

/// Write `bytes` to a fresh temp file in `dir` and rename it onto `target`.
///
/// Every call gets its own temp file, so concurrent writers of the same
/// target all succeed and the last rename wins.
fn persist_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".backup-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Write `document` to `path` as pretty JSON.
///
/// The bytes go to a temp file next to `path` first and are renamed into
/// place, so a reader never sees a half-written backup.
///
/// # Errors
///
/// Returns `AdminError::Io` or `AdminError::Serde`.
pub async fn write_document(path: &Path, document: &BackupDocument) -> Result<BackupWritten, AdminError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    tokio::fs::create_dir_all(&dir).await?;
    let bytes = serde_json::to_vec_pretty(document)?;
    let size = bytes.len();

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || persist_atomically(&dir, &target, &bytes))
        .await
        .map_err(std::io::Error::other)??;

    tracing::debug!(path = %path.display(), bytes = size, "backup document written");
    Ok(BackupWritten {
        path: path.to_path_buf(),
        tables: document.data.len(),
        rows: document.row_count(),
    })
}

/// Read and parse a backup document.
///
/// # Errors
///
/// Returns `AdminError::Io` when the file cannot be read and
/// `AdminError::Validation` when it is not a backup document.
pub async fn read_document(path: &Path) -> Result<BackupDocument, AdminError> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AdminError::Validation(format!("{} is not a backup document: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use raceday_core::backup::{BACKUP_FORMAT_VERSION, BackupMetadata, DEFAULT_SOURCE};
    use raceday_core::tables::Table;
    use serde_json::json;

    #[tokio::test]
    async fn document_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/backup.json");

        let mut doc = BackupDocument::new(BackupMetadata::new(
            "2026-10-19T03:00:00Z".parse().unwrap(),
            BACKUP_FORMAT_VERSION,
            DEFAULT_SOURCE,
        ));
        doc.set_rows(
            Table::Sellers,
            vec![json!({"id": "sel-1", "name": "Shop"}).as_object().cloned().unwrap()],
        );

        let written = write_document(&path, &doc).await.unwrap();
        assert_eq!(written.rows, 1);
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("backup.json")]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"metadata\""), "expected pretty JSON");
        assert_eq!(read_document(&path).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn garbage_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{\"data\": []}").unwrap();
        assert!(matches!(
            read_document(&path).await,
            Err(AdminError::Validation(_))
        ));
    }
}

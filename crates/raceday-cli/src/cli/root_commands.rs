use clap::{Args, Subcommand};
use raceday_core::tables::Table;

use crate::cli::subcommands::{AuditCommands, BackupCommands, CsvCommands};
use crate::commands::shared::parse::{parse_condition, parse_table};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Backup export, restore, and daily auto-backups.
    Backup {
        #[command(subcommand)]
        action: BackupCommands,
    },
    /// Read the audit log.
    Audit {
        #[command(subcommand)]
        action: AuditCommands,
    },
    /// Delete one row, recording it in the audit log first.
    Delete(DeleteArgs),
    /// Delete every row matching the given conditions.
    DeleteMany(DeleteManyArgs),
    /// Mark a row as deleted without removing it.
    SoftDelete(RecordArgs),
    /// Clear a soft delete.
    RestoreDeleted(RecordArgs),
    /// Payment-status import and registration export.
    Csv {
        #[command(subcommand)]
        action: CsvCommands,
    },
    /// Print the JSON schema of an output or document type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct RecordArgs {
    /// Table name (`registrations`) or entity name (`Registration`).
    #[arg(value_parser = parse_table)]
    pub table: Table,
    pub id: String,
}

#[derive(Clone, Debug, Args)]
pub struct DeleteArgs {
    /// Table name (`registrations`) or entity name (`Registration`).
    #[arg(value_parser = parse_table)]
    pub table: Table,
    pub id: String,
    /// Record the entry as FORCE_DELETE.
    #[arg(long)]
    pub force: bool,
    /// Log only the id instead of the full row.
    #[arg(long)]
    pub skip_snapshot: bool,
    /// Do not write an audit entry.
    #[arg(long)]
    pub skip_audit: bool,
}

#[derive(Clone, Debug, Args)]
pub struct DeleteManyArgs {
    #[arg(value_parser = parse_table)]
    pub table: Table,
    /// Equality condition; repeat to combine.
    #[arg(
        long = "where",
        value_name = "COLUMN=VALUE",
        required = true,
        value_parser = parse_condition
    )]
    pub conditions: Vec<(String, String)>,
    #[arg(long)]
    pub force: bool,
    /// One audit entry per deleted row instead of a single batch entry.
    #[arg(long)]
    pub each: bool,
    #[arg(long)]
    pub skip_audit: bool,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// One of: backup-document, action-result, restore-report,
    /// import-report, auto-backup-status, audit-entry.
    pub type_name: String,
}

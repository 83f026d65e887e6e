use clap::{Subcommand, ValueEnum};
use raceday_core::responses::RestorePolicy;

/// Backup commands.
#[derive(Clone, Debug, Subcommand)]
pub enum BackupCommands {
    /// Export every backed-up table to a JSON file.
    Export {
        /// Output file (default: `backup-<timestamp>.json` in the working directory).
        #[arg(long)]
        out: Option<String>,
        /// Nest distances, price tiers, and order items under their parents.
        #[arg(long)]
        embed: bool,
    },
    /// Restore a backup file.
    Restore {
        file: String,
        #[arg(long, value_enum, default_value = "merge")]
        mode: RestoreMode,
        /// Confirm a replacing restore, which wipes every table first.
        #[arg(long)]
        yes: bool,
    },
    /// Write today's auto-backup if it is missing, then prune old ones.
    Auto,
    /// List auto-backup files, newest first.
    List,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RestoreMode {
    Replace,
    Merge,
}

impl From<RestoreMode> for RestorePolicy {
    fn from(mode: RestoreMode) -> Self {
        match mode {
            RestoreMode::Replace => Self::Replace,
            RestoreMode::Merge => Self::Merge,
        }
    }
}

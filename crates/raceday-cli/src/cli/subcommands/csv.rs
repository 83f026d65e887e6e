use clap::Subcommand;
use raceday_db::csv::ImportTarget;

use crate::commands::shared::parse::parse_import_target;

/// CSV commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CsvCommands {
    /// Apply payment statuses from a spreadsheet export.
    Import {
        file: String,
        /// `registrations` or `orders`.
        #[arg(long, value_parser = parse_import_target, default_value = "registrations")]
        target: ImportTarget,
    },
    /// Export an event's registrations as CSV.
    Export {
        /// Event slug.
        slug: String,
        /// Output file (default: `registrations-<slug>-<date>.csv`).
        #[arg(long)]
        out: Option<String>,
    },
}

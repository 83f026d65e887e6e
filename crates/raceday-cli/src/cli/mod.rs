use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `raceday` binary.
#[derive(Debug, Parser)]
#[command(
    name = "raceday",
    version,
    about = "raceday back-office: backups, audit log, audited deletes, payment CSVs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only in the log)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;
    use raceday_core::tables::Table;

    use super::subcommands::{AuditCommands, BackupCommands, CsvCommands, RestoreMode};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "raceday", "--format", "raw", "--limit", "10", "--verbose", "audit", "recent",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Audit {
                action: AuditCommands::Recent { limit: None }
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["raceday", "backup", "list", "--quiet"])
            .expect("cli should parse");
        assert!(cli.quiet);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Backup {
                action: BackupCommands::List
            }
        ));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["raceday", "--format", "table", "backup", "list"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn restore_defaults_to_merge() {
        let cli = Cli::try_parse_from(["raceday", "backup", "restore", "backup.json"])
            .expect("cli should parse");
        let Commands::Backup {
            action: BackupCommands::Restore { file, mode, yes },
        } = cli.command
        else {
            panic!("expected backup restore");
        };
        assert_eq!(file, "backup.json");
        assert_eq!(mode, RestoreMode::Merge);
        assert!(!yes);
    }

    #[test]
    fn delete_accepts_entity_names_and_document_keys() {
        for table in ["registrations", "Registration"] {
            let cli = Cli::try_parse_from(["raceday", "delete", table, "reg-01", "--force"])
                .expect("cli should parse");
            let Commands::Delete(args) = cli.command else {
                panic!("expected delete");
            };
            assert_eq!(args.table, Table::Registrations);
            assert!(args.force);
        }
    }

    #[test]
    fn delete_rejects_unknown_tables() {
        let parsed = Cli::try_parse_from(["raceday", "delete", "racers", "x"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn delete_many_needs_a_condition() {
        assert!(Cli::try_parse_from(["raceday", "delete-many", "registrations"]).is_err());

        let cli = Cli::try_parse_from([
            "raceday",
            "delete-many",
            "registrations",
            "--where",
            "distanceId=dst-2",
            "--where",
            "status=CANCELLED",
        ])
        .expect("cli should parse");
        let Commands::DeleteMany(args) = cli.command else {
            panic!("expected delete-many");
        };
        assert_eq!(
            args.conditions,
            vec![
                ("distanceId".to_string(), "dst-2".to_string()),
                ("status".to_string(), "CANCELLED".to_string()),
            ]
        );
    }

    #[test]
    fn csv_import_parses_target() {
        let cli = Cli::try_parse_from([
            "raceday", "csv", "import", "paid.csv", "--target", "orders",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Csv {
                action: CsvCommands::Import { target: raceday_db::csv::ImportTarget::Orders, .. }
            }
        ));
        assert!(
            Cli::try_parse_from(["raceday", "csv", "import", "x.csv", "--target", "events"]).is_err()
        );
    }
}

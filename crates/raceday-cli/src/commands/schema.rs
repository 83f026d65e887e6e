use raceday_core::backup::BackupDocument;
use raceday_core::entities::AuditEntry;
use raceday_core::responses::{ActionResult, AutoBackupStatus, ImportReport, RestoreReport};
use schemars::{Schema, schema_for};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Type names accepted by `raceday schema`.
const TYPE_NAMES: &[&str] = &[
    "backup-document",
    "action-result",
    "restore-report",
    "import-report",
    "auto-backup-status",
    "audit-entry",
];

fn schema_for_name(name: &str) -> Option<Schema> {
    let schema = match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "backup-document" => schema_for!(BackupDocument),
        "action-result" => schema_for!(ActionResult),
        "restore-report" => schema_for!(RestoreReport),
        "import-report" => schema_for!(ImportReport),
        "auto-backup-status" => schema_for!(AutoBackupStatus),
        "audit-entry" => schema_for!(AuditEntry),
        _ => return None,
    };
    Some(schema)
}

/// Handle `raceday schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schema_for_name(&args.type_name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown type '{}' (expected one of: {})",
            args.type_name,
            TYPE_NAMES.join(", ")
        )
    })?;
    output(&schema, flags.format)
}

#[cfg(test)]
mod tests {
    use super::{TYPE_NAMES, schema_for_name};

    #[test]
    fn every_listed_type_has_a_schema() {
        for name in TYPE_NAMES {
            let schema = schema_for_name(name).expect("listed type should resolve");
            let value = serde_json::to_value(&schema).expect("schema should serialize");
            assert!(value.is_object(), "{name}");
        }
    }

    #[test]
    fn names_are_normalized() {
        assert!(schema_for_name("Backup_Document").is_some());
        assert!(schema_for_name("registration").is_none());
    }
}

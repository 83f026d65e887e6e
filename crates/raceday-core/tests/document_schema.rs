//! Serde roundtrip and JsonSchema validation for exchanged documents.

use chrono::Utc;
use raceday_core::backup::{BACKUP_FORMAT_VERSION, BackupDocument, BackupMetadata, DEFAULT_SOURCE};
use raceday_core::entities::AuditEntry;
use raceday_core::enums::{AuditAction, PaymentStatus};
use raceday_core::record::Filter;
use raceday_core::responses::*;
use raceday_core::tables::Table;
use schemars::schema_for;
use serde_json::json;

fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn sample_document() -> BackupDocument {
    let mut meta = BackupMetadata::new(Utc::now(), BACKUP_FORMAT_VERSION, DEFAULT_SOURCE);
    meta.tables = vec![Table::Users, Table::Events];
    let mut doc = BackupDocument::new(meta);
    doc.set_rows(
        Table::Users,
        vec![
            json!({"id": "usr-1", "email": "ada@example.com", "role": "ADMIN"})
                .as_object()
                .cloned()
                .unwrap(),
        ],
    );
    doc.set_rows(
        Table::Events,
        vec![
            json!({
                "id": "evt-1",
                "organizerId": "usr-1",
                "title": "Spring Run",
                "slug": "spring-run",
                "startDate": "2026-04-12T07:00:00Z",
                "formConfig": {"fields": [{"name": "tshirt", "type": "select"}]}
            })
            .as_object()
            .cloned()
            .unwrap(),
        ],
    );
    doc
}

roundtrip_and_validate!(backup_document_roundtrip, BackupDocument, sample_document());

roundtrip_and_validate!(
    audit_entry_roundtrip,
    AuditEntry,
    AuditEntry {
        id: "aud-a3f8b2c1".into(),
        user_id: "usr-1".into(),
        user_name: "Ada".into(),
        action: AuditAction::SoftDelete,
        entity_type: "Registration".into(),
        entity_id: "reg-1".into(),
        entity_data: Some(json!({"firstName": "Ada", "paymentStatus": PaymentStatus::Paid.as_str()})),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    restore_report_roundtrip,
    RestoreReport,
    {
        let mut report = RestoreReport::new(RestorePolicy::Merge);
        report.stats_mut(Table::Registrations).updated = 3;
        report.stats_mut(Table::Registrations).skipped = 1;
        report.warnings.push("registrations reg-9: missing eventId parent".into());
        report.duration_ms = 42;
        report
    }
);

roundtrip_and_validate!(
    auto_backup_created_roundtrip,
    AutoBackupStatus,
    AutoBackupStatus::Created {
        file: "backup-2026-10-19.json".into(),
        pruned: vec!["backup-2026-09-18.json".into()],
        warnings: vec![],
    }
);

roundtrip_and_validate!(
    import_report_roundtrip,
    ImportReport,
    ImportReport {
        updated: 9,
        db_errors: 1,
        skipped_rows: 0,
        unknown_status: 2,
        delimiter: ";".into(),
        errors: vec!["reg-404: not found".into()],
    }
);

roundtrip_and_validate!(
    action_result_roundtrip,
    ActionResult,
    ActionResult::ok("done").with_warnings(vec!["one table empty".into()])
);

roundtrip_and_validate!(
    filter_roundtrip,
    Filter,
    Filter::all()
        .equals("entityType", "Registration")
        .is_null("deletedAt")
        .newest_first("createdAt")
        .limit(50)
);

#[test]
fn document_without_source_defaults_and_validates() {
    let raw = json!({
        "metadata": {"timestamp": "2026-01-01T00:00:00Z", "version": "2.0"},
        "data": {}
    });
    let doc: BackupDocument = serde_json::from_value(raw).unwrap();
    assert_eq!(doc.metadata.source, DEFAULT_SOURCE);
    assert_eq!(doc.row_count(), 0);
}

#[test]
fn auto_backup_status_is_tagged() {
    let value = serde_json::to_value(AutoBackupStatus::Exists {
        file: "backup-2026-10-19.json".into(),
    })
    .unwrap();
    assert_eq!(
        value,
        json!({"status": "exists", "file": "backup-2026-10-19.json"})
    );
}

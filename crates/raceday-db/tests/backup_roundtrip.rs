//! Backup export and restore across both stores.
//!
//! - export → replace reproduces every table row for row
//! - embedded exports restore to the same rows as flat ones
//! - merge leaves unrelated rows alone and never deletes
//! - a restore that outlives its timeout changes nothing
//! - exported documents validate against the generated JSON schema

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use raceday_config::RacedayConfig;
use raceday_core::backup::BackupDocument;
use raceday_core::responses::RestorePolicy;
use raceday_core::tables::Table;
use raceday_db::backup::{ExportOptions, read_document};
use raceday_db::store::UnitOfWork;
use raceday_db::{AdminError, AdminService, MemoryStore};
use serde_json::json;

use common::{admin, memory_service, rec, runner, seed, snapshot, sql_service};

#[tokio::test]
async fn replace_round_trip_on_sql_store() {
    let svc = sql_service().await;
    seed(svc.store()).await;
    let before = snapshot(svc.store()).await;

    let doc = svc.create_backup(&admin(), &ExportOptions::default()).await.unwrap();
    // Diverge from the backup before restoring it.
    svc.store()
        .update(Table::Events, "evt-1", rec(json!({"title": "Renamed"})))
        .await
        .unwrap();
    svc.store()
        .insert_many(Table::Sellers, vec![rec(json!({"id": "sel-extra", "name": "Extra"}))])
        .await
        .unwrap();

    let report = svc.restore_replace(&admin(), &doc).await.unwrap();

    assert_eq!(snapshot(svc.store()).await, before);
    assert_eq!(report.stats(Table::Sellers).unwrap().deleted, 2);
    assert_eq!(report.stats(Table::Registrations).unwrap().inserted, 10);
    assert_eq!(report.total_skipped(), 0);
}

#[tokio::test]
async fn replace_round_trip_on_memory_store() {
    let svc = memory_service();
    seed(svc.store()).await;
    let before = snapshot(svc.store()).await;

    let doc = svc.create_backup(&admin(), &ExportOptions::default()).await.unwrap();
    svc.store()
        .delete(Table::OrderItems, &raceday_core::record::Filter::all())
        .await
        .unwrap();

    svc.restore_replace(&admin(), &doc).await.unwrap();
    assert_eq!(snapshot(svc.store()).await, before);
}

#[tokio::test]
async fn sql_export_restores_into_memory_store() {
    let source = sql_service().await;
    seed(source.store()).await;
    let doc = source.create_backup(&admin(), &ExportOptions::default()).await.unwrap();

    let target = memory_service();
    target.restore_replace(&admin(), &doc).await.unwrap();

    assert_eq!(snapshot(target.store()).await, snapshot(source.store()).await);
}

#[tokio::test]
async fn embedded_export_restores_like_flat() {
    let svc = sql_service().await;
    seed(svc.store()).await;
    let before = snapshot(svc.store()).await;

    let doc = svc.create_backup(&admin(), &ExportOptions::embedded()).await.unwrap();
    assert!(doc.metadata.embedded_relations);
    assert!(doc.rows(Table::PriceTiers).is_empty());
    assert!(doc.rows(Table::OrderItems).is_empty());
    assert_eq!(doc.rows(Table::Events)[0]["distances"].as_array().unwrap().len(), 2);

    svc.restore_replace(&admin(), &doc).await.unwrap();
    assert_eq!(snapshot(svc.store()).await, before);
}

#[tokio::test]
async fn export_to_file_and_restore_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manual.json");
    let svc = memory_service();
    seed(svc.store()).await;

    let written = svc
        .export_to_file(&admin(), &path, &ExportOptions::default())
        .await
        .unwrap();
    assert_eq!(written.rows, 22);

    let fresh = memory_service();
    let report = fresh
        .restore_from_file(&admin(), &path, RestorePolicy::Merge)
        .await
        .unwrap();
    assert_eq!(report.total_written(), 22);
    assert_eq!(snapshot(fresh.store()).await, snapshot(svc.store()).await);
}

#[tokio::test]
async fn merge_keeps_unrelated_rows() {
    let svc = memory_service();
    seed(svc.store()).await;

    let doc: BackupDocument = serde_json::from_value(json!({
        "metadata": {"timestamp": "2026-10-01T00:00:00Z", "version": "2.0", "source": "partial"},
        "data": {
            "users": [
                {"id": "usr-2", "email": "rita@new.example.com", "role": "USER"},
                {"id": "usr-9", "email": "new@example.com", "role": "USER"}
            ]
        }
    }))
    .unwrap();

    let report = svc.restore_merge(&admin(), &doc).await.unwrap();
    let users = report.stats(Table::Users).unwrap();
    assert_eq!((users.inserted, users.updated, users.deleted), (1, 1, 0));

    let ada = svc.store().fetch(Table::Users, "usr-1").await.unwrap().unwrap();
    assert_eq!(ada["membershipTierId"], json!("mt-1"));

    let rita = svc.store().fetch(Table::Users, "usr-2").await.unwrap().unwrap();
    assert_eq!(rita["email"], json!("rita@new.example.com"));
    // Columns absent from the document keep their value.
    assert_eq!(rita["name"], json!("Rita Runner"));

    assert_eq!(svc.store().row_count(Table::Users).await, 3);
    assert_eq!(svc.store().row_count(Table::Registrations).await, 10);
}

#[tokio::test]
async fn merge_checks_registration_references() {
    let svc = sql_service().await;
    seed(svc.store()).await;

    let doc: BackupDocument = serde_json::from_value(json!({
        "metadata": {"timestamp": "2026-10-01T00:00:00Z", "version": "2.0"},
        "data": {
            "registrations": [
                {"id": "reg-new", "eventId": "evt-1", "distanceId": "dst-gone", "firstName": "A",
                 "lastName": "B", "email": "a@b", "paymentStatus": "PAID", "status": "CONFIRMED"},
                {"id": "reg-01", "userId": "usr-gone", "paymentStatus": "PAID"}
            ]
        }
    }))
    .unwrap();

    let report = svc.restore_merge(&admin(), &doc).await.unwrap();
    let stats = report.stats(Table::Registrations).unwrap();
    assert_eq!((stats.skipped, stats.updated), (1, 1));
    assert_eq!(report.warnings.len(), 2, "{:?}", report.warnings);

    assert!(svc.store().fetch(Table::Registrations, "reg-new").await.unwrap().is_none());
    let reg = svc.store().fetch(Table::Registrations, "reg-01").await.unwrap().unwrap();
    assert_eq!(reg["paymentStatus"], json!("PAID"));
    assert!(!reg.contains_key("userId"));
}

#[tokio::test]
async fn timed_out_merge_changes_nothing() {
    let mut config = RacedayConfig::default();
    config.backup.merge_timeout_secs = 1;
    let svc = AdminService::new(MemoryStore::new(), config);
    svc.store().delay_writes(Duration::from_millis(400)).await;

    let sellers: Vec<_> = (1..=5)
        .map(|n| json!({"id": format!("sel-{n}"), "name": format!("Seller {n}")}))
        .collect();
    let doc: BackupDocument = serde_json::from_value(json!({
        "metadata": {"timestamp": "2026-10-01T00:00:00Z", "version": "2.0"},
        "data": {"sellers": sellers}
    }))
    .unwrap();

    let err = svc.restore_merge(&admin(), &doc).await.unwrap_err();
    assert!(matches!(err, AdminError::Transaction(ref msg) if msg.contains("timed out")), "{err}");

    svc.store().clear_faults().await;
    assert_eq!(svc.store().row_count(Table::Sellers).await, 0);
    assert!(svc.recent_logs(None).await.is_empty());
}

#[tokio::test]
async fn failed_replace_rolls_back_the_wipe() {
    let svc = sql_service().await;
    seed(svc.store()).await;
    let before = snapshot(svc.store()).await;

    // Distance without its required eventId: the insert fails after every table was cleared.
    let doc: BackupDocument = serde_json::from_value(json!({
        "metadata": {"timestamp": "2026-10-01T00:00:00Z", "version": "2.0"},
        "data": {"distances": [{"id": "dst-x", "name": "Broken"}]}
    }))
    .unwrap();

    let err = svc.restore_replace(&admin(), &doc).await.unwrap_err();
    assert!(matches!(err, AdminError::Transaction(_)), "{err}");
    assert_eq!(snapshot(svc.store()).await, before);
}

#[tokio::test]
async fn restore_rejects_newer_major_version() {
    let svc = memory_service();
    let doc: BackupDocument = serde_json::from_value(json!({
        "metadata": {"timestamp": "2026-10-01T00:00:00Z", "version": "3.0"},
        "data": {}
    }))
    .unwrap();
    assert!(matches!(
        svc.restore(&admin(), &doc, RestorePolicy::Merge).await,
        Err(AdminError::Validation(_))
    ));
}

#[tokio::test]
async fn non_admins_cannot_export_or_restore() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.json");
    let svc = memory_service();
    seed(svc.store()).await;

    assert!(matches!(
        svc.create_backup(&runner(), &ExportOptions::default()).await,
        Err(AdminError::Unauthorized(_))
    ));
    assert!(matches!(
        svc.export_to_file(&runner(), &path, &ExportOptions::default()).await,
        Err(AdminError::Unauthorized(_))
    ));
    assert!(!path.exists());

    // The file does not exist, but authorization is checked first.
    assert!(matches!(
        svc.restore_from_file(&runner(), &path, RestorePolicy::Replace).await,
        Err(AdminError::Unauthorized(_))
    ));
    assert_eq!(svc.store().row_count(Table::Users).await, 2);
}

#[tokio::test]
async fn export_rejects_tables_outside_backups() {
    let svc = memory_service();
    let options = ExportOptions {
        tables: vec![Table::Users, Table::AuditLogs],
        embed_relations: false,
    };
    assert!(matches!(
        svc.create_backup(&admin(), &options).await,
        Err(AdminError::Validation(_))
    ));
}

#[tokio::test]
async fn exported_document_matches_its_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    let svc = sql_service().await;
    seed(svc.store()).await;
    svc.export_to_file(&admin(), &path, &ExportOptions::default())
        .await
        .unwrap();

    let doc = read_document(&path).await.unwrap();
    let schema = serde_json::to_value(schemars::schema_for!(BackupDocument)).unwrap();
    let validator = jsonschema::validator_for(&schema).expect("schema should be valid");
    let instance = serde_json::to_value(&doc).unwrap();
    let errors: Vec<String> = validator.iter_errors(&instance).map(|e| e.to_string()).collect();
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(doc.metadata.tables.len(), Table::RESTORE_ORDER.len());
}

//! Backup restore.
//!
//! Two policies, each inside one store transaction bounded by a timeout:
//!
//! - **replace** wipes every managed table (children first) and bulk inserts
//!   the document (parents first). It assumes a self-consistent document;
//!   any failure rolls the whole thing back.
//! - **merge** upserts row by row in parent-first order and never deletes.
//!   Foreign keys are checked against the transaction's own view, so parents
//!   upserted earlier in the run count. An unresolved nullable reference is
//!   cleared; an unresolved required one skips the row. Both cases add a
//!   warning instead of failing.
//!
//! A successful restore is recorded as one `RESTORE` audit entry after commit.

use std::path::Path;
use std::time::Instant;

use raceday_core::backup::{BackupDocument, BackupMetadata, SUPPORTED_MAJOR_VERSION};
use raceday_core::enums::AuditAction;
use raceday_core::identity::Actor;
use raceday_core::record::{Filter, Record, record_id};
use raceday_core::responses::{RestorePolicy, RestoreReport};
use raceday_core::tables::Table;
use serde_json::{Value, json};

use super::normalize::{Normalized, normalize_document};
use super::read_document;
use crate::error::AdminError;
use crate::helpers::format_timestamp;
use crate::service::{AdminService, require_admin};
use crate::store::{EntityStore, UnitOfWork, UpsertOutcome, settle};

/// Entity type recorded on restore audit entries.
pub const BACKUP_ENTITY_TYPE: &str = "Backup";

/// Reject documents written by a newer, incompatible format.
///
/// # Errors
///
/// `AdminError::Validation` when the major version is unreadable or too new.
pub fn check_version(metadata: &BackupMetadata) -> Result<(), AdminError> {
    match metadata.major_version() {
        Some(major) if major <= SUPPORTED_MAJOR_VERSION => Ok(()),
        Some(major) => Err(AdminError::Validation(format!(
            "backup format version {} (major {major}) is newer than supported major {SUPPORTED_MAJOR_VERSION}",
            metadata.version
        ))),
        None => Err(AdminError::Validation(format!(
            "unreadable backup format version '{}'",
            metadata.version
        ))),
    }
}

async fn replace_all<U: UnitOfWork>(
    uow: &U,
    tables: Vec<(Table, Vec<Record>)>,
) -> Result<RestoreReport, AdminError> {
    let mut report = RestoreReport::new(RestorePolicy::Replace);
    for table in Table::RESTORE_ORDER {
        report.stats_mut(*table);
    }

    for table in Table::DELETE_ORDER {
        let deleted = uow.delete(*table, &Filter::all()).await?;
        tracing::debug!(%table, deleted, "table cleared");
        report.stats_mut(*table).deleted = deleted;
    }

    for (table, rows) in tables {
        let inserted = uow.insert_many(table, rows).await?;
        tracing::debug!(%table, inserted, "table reloaded");
        report.stats_mut(table).inserted = inserted;
    }
    Ok(report)
}

/// Check every declared foreign key of `row` against the unit of work.
///
/// Returns `false` when the row must be skipped.
async fn resolve_references<U: UnitOfWork>(
    uow: &U,
    table: Table,
    id: &str,
    row: &mut Record,
    warnings: &mut Vec<String>,
) -> Result<bool, AdminError> {
    for key in table.schema().foreign_keys {
        let target = match row.get(key.column) {
            None | Some(Value::Null) => continue,
            Some(Value::String(parent_id)) => parent_id.clone(),
            Some(other) => other.to_string(),
        };
        if uow.exists(key.parent, &target).await? {
            continue;
        }
        if key.required {
            warnings.push(format!(
                "{table} {id}: {} references missing {} {target}; row skipped",
                key.column,
                key.parent.entity_name()
            ));
            return Ok(false);
        }
        warnings.push(format!(
            "{table} {id}: {} references missing {} {target}; reference cleared",
            key.column,
            key.parent.entity_name()
        ));
        row.insert(key.column.to_string(), Value::Null);
    }
    Ok(true)
}

async fn merge_all<U: UnitOfWork>(
    uow: &U,
    tables: Vec<(Table, Vec<Record>)>,
) -> Result<RestoreReport, AdminError> {
    let mut report = RestoreReport::new(RestorePolicy::Merge);

    for (table, rows) in tables {
        report.stats_mut(table);
        for mut row in rows {
            let Some(id) = record_id(&row).map(str::to_string) else {
                report.stats_mut(table).skipped += 1;
                report.warnings.push(format!("{table}: skipped a row without an id"));
                continue;
            };

            if !resolve_references(uow, table, &id, &mut row, &mut report.warnings).await? {
                report.stats_mut(table).skipped += 1;
                continue;
            }

            if !uow.exists(table, &id).await? {
                let mut candidate = row.clone();
                candidate.retain(|_, v| !v.is_null());
                let missing = table.schema().missing_required(&candidate);
                if !missing.is_empty() {
                    report.stats_mut(table).skipped += 1;
                    report.warnings.push(format!(
                        "{table} {id}: new row is missing {}; row skipped",
                        missing.join(", ")
                    ));
                    continue;
                }
            }

            match uow.upsert(table, &id, row).await? {
                UpsertOutcome::Inserted => report.stats_mut(table).inserted += 1,
                UpsertOutcome::Updated => report.stats_mut(table).updated += 1,
            }
        }
    }
    Ok(report)
}

impl<S: EntityStore> AdminService<S> {
    /// Restore a document with the given policy.
    ///
    /// # Errors
    ///
    /// See [`Self::restore_replace`] and [`Self::restore_merge`].
    pub async fn restore(
        &self,
        actor: &Actor,
        document: &BackupDocument,
        policy: RestorePolicy,
    ) -> Result<RestoreReport, AdminError> {
        match policy {
            RestorePolicy::Replace => self.restore_replace(actor, document).await,
            RestorePolicy::Merge => self.restore_merge(actor, document).await,
        }
    }

    /// Wipe every managed table and reload it from `document`.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Validation` for an unsupported version, or
    /// `Transaction` when any step fails or the replace timeout elapses. In
    /// the last case nothing was changed.
    pub async fn restore_replace(
        &self,
        actor: &Actor,
        document: &BackupDocument,
    ) -> Result<RestoreReport, AdminError> {
        require_admin(actor, "backup restore")?;
        check_version(&document.metadata)?;
        let started = Instant::now();
        let Normalized { tables, warnings } = normalize_document(document);

        let limit = self.config().backup.replace_timeout();
        let tx = self.store().begin().await.map_err(|e| AdminError::from(e).into_transaction())?;
        let outcome = tokio::time::timeout(limit, replace_all(&tx, tables)).await;
        let report = settle(tx, outcome, limit)
            .await
            .map_err(AdminError::into_transaction)?;

        Ok(self.finish_restore(actor, document, report, warnings, started).await)
    }

    /// Upsert every row of `document` without deleting anything.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Validation` for an unsupported version, or
    /// `Transaction` when a statement fails or the merge timeout elapses.
    /// Unresolvable references and incomplete rows are warnings, not errors.
    pub async fn restore_merge(
        &self,
        actor: &Actor,
        document: &BackupDocument,
    ) -> Result<RestoreReport, AdminError> {
        require_admin(actor, "backup restore")?;
        check_version(&document.metadata)?;
        let started = Instant::now();
        let Normalized { tables, warnings } = normalize_document(document);

        let limit = self.config().backup.merge_timeout();
        let tx = self.store().begin().await.map_err(|e| AdminError::from(e).into_transaction())?;
        let outcome = tokio::time::timeout(limit, merge_all(&tx, tables)).await;
        let report = settle(tx, outcome, limit)
            .await
            .map_err(AdminError::into_transaction)?;

        Ok(self.finish_restore(actor, document, report, warnings, started).await)
    }

    /// Read a document from disk and restore it.
    ///
    /// # Errors
    ///
    /// `Unauthorized` before the file is touched, I/O and parse failures,
    /// then the errors of the chosen policy.
    pub async fn restore_from_file(
        &self,
        actor: &Actor,
        path: &Path,
        policy: RestorePolicy,
    ) -> Result<RestoreReport, AdminError> {
        require_admin(actor, "backup restore")?;
        let document = read_document(path).await?;
        self.restore(actor, &document, policy).await
    }

    async fn finish_restore(
        &self,
        actor: &Actor,
        document: &BackupDocument,
        mut report: RestoreReport,
        normalize_warnings: Vec<String>,
        started: Instant,
    ) -> RestoreReport {
        report.warnings.splice(0..0, normalize_warnings);
        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let summary = json!({
            "policy": report.policy,
            "source": document.metadata.source,
            "version": document.metadata.version,
            "written": report.total_written(),
            "skipped": report.total_skipped(),
            "tables": report.tables,
        });
        let outcome = self
            .log_action(
                Some(actor),
                AuditAction::Restore,
                BACKUP_ENTITY_TYPE,
                &format_timestamp(document.metadata.timestamp),
                Some(&summary),
            )
            .await;
        report.warnings.extend(outcome.warning());

        tracing::info!(
            actor = %actor.id,
            policy = %report.policy,
            written = report.total_written(),
            skipped = report.total_skipped(),
            warnings = report.warnings.len(),
            duration_ms = report.duration_ms,
            "backup restored"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use raceday_config::RacedayConfig;
    use raceday_core::enums::Role;

    use crate::store::MemoryStore;

    fn admin() -> Actor {
        Actor::new("usr-admin", "Admin", Role::Admin)
    }

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn document(data: Value) -> BackupDocument {
        serde_json::from_value(json!({
            "metadata": {"timestamp": "2026-10-01T00:00:00Z", "version": "2.0", "source": "test"},
            "data": data
        }))
        .unwrap()
    }

    #[rstest::rstest]
    #[case("1.0", true)]
    #[case("2.0", true)]
    #[case("2.7", true)]
    #[case("3.0", false)]
    #[case("next", false)]
    fn version_gate(#[case] version: &str, #[case] accepted: bool) {
        let meta = BackupMetadata::new(Utc::now(), version, "test");
        assert_eq!(check_version(&meta).is_ok(), accepted);
    }

    #[tokio::test]
    async fn merge_clears_nullable_and_skips_required() {
        let svc = AdminService::new(MemoryStore::new(), RacedayConfig::default());
        let doc = document(json!({
            "users": [
                {"id": "usr-1", "email": "a@x", "role": "USER", "membershipTierId": "mt-gone"}
            ],
            "events": [
                {"id": "evt-1", "organizerId": "usr-missing", "title": "Run", "slug": "run",
                 "startDate": "2026-05-01T07:00:00Z"}
            ]
        }));

        let report = svc.restore_merge(&admin(), &doc).await.unwrap();

        assert_eq!(report.stats(Table::Users).unwrap().inserted, 1);
        assert_eq!(report.stats(Table::Events).unwrap().skipped, 1);
        assert_eq!(report.warnings.len(), 2, "{:?}", report.warnings);

        let user = svc.store().fetch(Table::Users, "usr-1").await.unwrap().unwrap();
        assert!(!user.contains_key("membershipTierId"));
        assert!(svc.store().fetch(Table::Events, "evt-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_sees_parents_from_the_same_run() {
        let svc = AdminService::new(MemoryStore::new(), RacedayConfig::default());
        let doc = document(json!({
            "users": [{"id": "usr-1", "email": "a@x", "role": "ADMIN"}],
            "events": [{"id": "evt-1", "organizerId": "usr-1", "title": "Run", "slug": "run",
                        "startDate": "2026-05-01T07:00:00Z"}]
        }));
        let report = svc.restore_merge(&admin(), &doc).await.unwrap();
        assert_eq!(report.total_written(), 2);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[tokio::test]
    async fn merge_skips_rows_without_id_or_required_columns() {
        let svc = AdminService::new(MemoryStore::new(), RacedayConfig::default());
        let doc = document(json!({
            "sellers": [{"name": "No id"}, {"id": "sel-2"}, {"id": "sel-3", "name": "Ok"}]
        }));
        let report = svc.restore_merge(&admin(), &doc).await.unwrap();
        let stats = report.stats(Table::Sellers).unwrap();
        assert_eq!((stats.inserted, stats.skipped), (1, 2));
    }

    #[tokio::test]
    async fn replace_counts_deleted_rows() {
        let store = MemoryStore::new();
        store
            .insert_many(Table::Sellers, vec![rec(json!({"id": "sel-old", "name": "Old"}))])
            .await
            .unwrap();
        let svc = AdminService::new(store, RacedayConfig::default());
        let doc = document(json!({"sellers": [{"id": "sel-new", "name": "New"}]}));

        let report = svc.restore_replace(&admin(), &doc).await.unwrap();
        let stats = report.stats(Table::Sellers).unwrap();
        assert_eq!((stats.deleted, stats.inserted), (1, 1));
        assert_eq!(report.tables.len(), Table::RESTORE_ORDER.len());
        assert!(svc.store().fetch(Table::Sellers, "sel-old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn successful_restore_is_audited() {
        let svc = AdminService::new(MemoryStore::new(), RacedayConfig::default());
        let doc = document(json!({"sellers": [{"id": "sel-1", "name": "Shop"}]}));
        svc.restore_merge(&admin(), &doc).await.unwrap();

        let logs = svc
            .logs_for_entity(BACKUP_ENTITY_TYPE, "2026-10-01T00:00:00.000000Z", None)
            .await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, AuditAction::Restore);
        assert_eq!(logs[0].entity_data.as_ref().unwrap()["written"], json!(1));
    }
}

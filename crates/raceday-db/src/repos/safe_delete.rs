//! Audited deletion.
//!
//! Every destructive operation here follows the same discipline: check the
//! actor, read the row, write the audit entry, then mutate. The audit write
//! happens strictly before the mutation and is not part of it, so an entry
//! exists even when the delete itself fails. An audit failure never blocks
//! the mutation; it is reported back as a warning.

use std::fmt;

use chrono::Utc;
use raceday_core::enums::AuditAction;
use raceday_core::identity::Actor;
use raceday_core::record::{Filter, Record, record_id};
use raceday_core::tables::{DELETED_AT, Table};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::AdminError;
use crate::helpers::format_timestamp;
use crate::service::{AdminService, require_admin};
use crate::store::{EntityStore, UnitOfWork};

/// Entity id recorded on batch entries that describe a filter instead of a row.
pub const BATCH_ENTITY_ID: &str = "BATCH";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Do not write any audit entry.
    pub skip_audit_log: bool,
    /// Record only `{"id": ...}` instead of the full row.
    pub skip_snapshot: bool,
    /// Record the entry as `FORCE_DELETE`.
    pub force_delete: bool,
    /// Bulk deletes only: write one entry per matching row instead of one
    /// entry carrying the filter.
    pub log_each_item: bool,
}

impl DeleteOptions {
    const fn action(self) -> AuditAction {
        if self.force_delete {
            AuditAction::ForceDelete
        } else {
            AuditAction::Delete
        }
    }
}

/// A single row removed by [`AdminService::safe_delete`].
#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub table: Table,
    pub record: Record,
    pub warnings: Vec<String>,
}

impl fmt::Display for Deleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deleted {} {}",
            self.table.entity_name(),
            record_id(&self.record).unwrap_or("?")
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleted {
    pub table: Table,
    pub count: u64,
    pub warnings: Vec<String>,
}

impl fmt::Display for BulkDeleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deleted {} rows from {}", self.count, self.table)
    }
}

/// A row after its `deletedAt` marker was set or cleared.
#[derive(Debug, Clone, Serialize)]
pub struct SoftDeleteChange {
    pub table: Table,
    pub record: Record,
    pub warnings: Vec<String>,
}

impl fmt::Display for SoftDeleteChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = record_id(&self.record).unwrap_or("?");
        if self.record.contains_key(DELETED_AT) {
            write!(f, "soft-deleted {} {id}", self.table.entity_name())
        } else {
            write!(f, "restored {} {id}", self.table.entity_name())
        }
    }
}

fn not_found(table: Table, id: &str) -> AdminError {
    AdminError::NotFound {
        entity: table.entity_name().to_string(),
        id: id.to_string(),
    }
}

/// Audit entries are append-only; no delete path may touch them.
fn require_mutable(table: Table) -> Result<(), AdminError> {
    if table == Table::AuditLogs {
        Err(AdminError::Validation(format!(
            "{table} is append-only and cannot be deleted or restored"
        )))
    } else {
        Ok(())
    }
}

fn require_soft_delete(table: Table) -> Result<(), AdminError> {
    if table.schema().soft_delete {
        Ok(())
    } else {
        Err(AdminError::Validation(format!(
            "{table} does not support soft delete"
        )))
    }
}

impl<S: EntityStore> AdminService<S> {
    async fn audit_row(
        &self,
        actor: &Actor,
        action: AuditAction,
        table: Table,
        id: &str,
        snapshot: Value,
        warnings: &mut Vec<String>,
    ) {
        let outcome = self
            .log_action(Some(actor), action, table.entity_name(), id, Some(&snapshot))
            .await;
        warnings.extend(outcome.warning());
    }

    async fn fetch_existing(&self, table: Table, id: &str) -> Result<Record, AdminError> {
        self.store()
            .fetch(table, id)
            .await?
            .ok_or_else(|| not_found(table, id))
    }

    /// Delete one row after recording it in the audit log.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Validation` for the audit log,
    /// `NotFound` when the row does not exist (nothing is written) or is gone
    /// by the time the delete runs, or the store error from the delete itself.
    /// In the last two cases the audit entry has already been written.
    pub async fn safe_delete(
        &self,
        actor: &Actor,
        table: Table,
        id: &str,
        options: DeleteOptions,
    ) -> Result<Deleted, AdminError> {
        require_admin(actor, "delete")?;
        require_mutable(table)?;
        let record = self.fetch_existing(table, id).await?;

        let mut warnings = Vec::new();
        if !options.skip_audit_log {
            let snapshot = if options.skip_snapshot {
                json!({ "id": id })
            } else {
                Value::Object(record.clone())
            };
            self.audit_row(actor, options.action(), table, id, snapshot, &mut warnings)
                .await;
        }

        if self.store().delete(table, &Filter::by_id(id)).await? == 0 {
            tracing::warn!(actor = %actor.id, %table, id, "row disappeared before the delete");
            return Err(not_found(table, id));
        }
        tracing::info!(actor = %actor.id, %table, id, force = options.force_delete, "row deleted");
        Ok(Deleted {
            table,
            record,
            warnings,
        })
    }

    /// Delete every row matching `filter`.
    ///
    /// Logs one batch entry carrying the filter, or one entry per row when
    /// `log_each_item` is set.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Validation` for the audit log, or the
    /// store error from the read or delete.
    pub async fn safe_delete_many(
        &self,
        actor: &Actor,
        table: Table,
        filter: &Filter,
        options: DeleteOptions,
    ) -> Result<BulkDeleted, AdminError> {
        require_admin(actor, "bulk delete")?;
        require_mutable(table)?;

        let mut warnings = Vec::new();
        if !options.skip_audit_log {
            if options.log_each_item {
                let rows = self.store().find(table, filter).await?;
                for row in rows {
                    let Some(id) = record_id(&row).map(str::to_string) else {
                        continue;
                    };
                    let snapshot = if options.skip_snapshot {
                        json!({ "id": id })
                    } else {
                        Value::Object(row)
                    };
                    self.audit_row(actor, options.action(), table, &id, snapshot, &mut warnings)
                        .await;
                }
            } else {
                let snapshot = json!({ "filter": filter });
                self.audit_row(
                    actor,
                    options.action(),
                    table,
                    BATCH_ENTITY_ID,
                    snapshot,
                    &mut warnings,
                )
                .await;
            }
        }

        let count = self.store().delete(table, filter).await?;
        tracing::info!(actor = %actor.id, %table, count, "rows deleted");
        Ok(BulkDeleted {
            table,
            count,
            warnings,
        })
    }

    /// Set `deletedAt` on one row after recording it in the audit log.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Validation` for tables without `deletedAt`,
    /// `NotFound`, or the store error from the update.
    pub async fn soft_delete(
        &self,
        actor: &Actor,
        table: Table,
        id: &str,
    ) -> Result<SoftDeleteChange, AdminError> {
        require_admin(actor, "soft delete")?;
        require_mutable(table)?;
        require_soft_delete(table)?;
        let record = self.fetch_existing(table, id).await?;

        let mut warnings = Vec::new();
        if record.contains_key(DELETED_AT) {
            warnings.push(format!("{} {id} was already soft-deleted", table.entity_name()));
        }
        self.audit_row(
            actor,
            AuditAction::SoftDelete,
            table,
            id,
            Value::Object(record),
            &mut warnings,
        )
        .await;

        let mut changes = Record::new();
        changes.insert(
            DELETED_AT.to_string(),
            Value::String(format_timestamp(Utc::now())),
        );
        self.store().update(table, id, changes).await?;
        let record = self.fetch_existing(table, id).await?;
        tracing::info!(actor = %actor.id, %table, id, "row soft-deleted");
        Ok(SoftDeleteChange {
            table,
            record,
            warnings,
        })
    }

    /// Clear `deletedAt` on one row after recording it in the audit log.
    ///
    /// # Errors
    ///
    /// Same as [`Self::soft_delete`].
    pub async fn restore_soft_delete(
        &self,
        actor: &Actor,
        table: Table,
        id: &str,
    ) -> Result<SoftDeleteChange, AdminError> {
        require_admin(actor, "restore")?;
        require_mutable(table)?;
        require_soft_delete(table)?;
        let record = self.fetch_existing(table, id).await?;

        let mut warnings = Vec::new();
        if !record.contains_key(DELETED_AT) {
            warnings.push(format!("{} {id} was not soft-deleted", table.entity_name()));
        }
        self.audit_row(
            actor,
            AuditAction::Restore,
            table,
            id,
            Value::Object(record),
            &mut warnings,
        )
        .await;

        let mut changes = Record::new();
        changes.insert(DELETED_AT.to_string(), Value::Null);
        self.store().update(table, id, changes).await?;
        let record = self.fetch_existing(table, id).await?;
        tracing::info!(actor = %actor.id, %table, id, "soft delete reverted");
        Ok(SoftDeleteChange {
            table,
            record,
            warnings,
        })
    }
}

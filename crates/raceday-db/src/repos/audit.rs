//! Audit log repository.
//!
//! Append-only entries recording who did what to which entity, with a JSON
//! snapshot taken before the change. Writing an entry never fails the
//! caller: the outcome says whether it was recorded, and a failure becomes a
//! warning the caller can surface. Reads are newest first, capped by
//! `audit.max_rows`, and return an empty list if the store fails.

use chrono::Utc;
use raceday_core::entities::AuditEntry;
use raceday_core::enums::AuditAction;
use raceday_core::identity::Actor;
use raceday_core::ids::{PREFIX_AUDIT, generate_id};
use raceday_core::record::{Filter, Record};
use raceday_core::tables::Table;
use serde_json::Value;

use crate::error::AdminError;
use crate::helpers::format_timestamp;
use crate::service::AdminService;
use crate::store::{EntityStore, UnitOfWork};

/// Result of an audit write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The entry was stored under this id.
    Recorded(String),
    /// The entry could not be stored; the reason is diagnostic only.
    Failed(String),
}

impl AuditOutcome {
    #[must_use]
    pub const fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }

    /// Warning text for callers that collect tolerated failures.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Recorded(_) => None,
            Self::Failed(reason) => Some(format!("audit log entry was not recorded: {reason}")),
        }
    }
}

fn entry_to_record(entry: &AuditEntry) -> Result<Record, AdminError> {
    let Value::Object(mut record) = serde_json::to_value(entry)? else {
        return Err(AdminError::Validation("audit entry did not serialize to an object".into()));
    };
    record.insert(
        "createdAt".to_string(),
        Value::String(format_timestamp(entry.created_at)),
    );
    Ok(record)
}

fn records_to_entries(records: Vec<Record>) -> Vec<AuditEntry> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.get("id").cloned();
            serde_json::from_value(Value::Object(record))
                .map_err(|e| tracing::warn!(?id, error = %e, "skipping unreadable audit row"))
                .ok()
        })
        .collect()
}

impl<S: EntityStore> AdminService<S> {
    /// Append an audit entry. Never returns an error.
    ///
    /// `None` as actor records the `SYSTEM` identity. `entity_data` is copied
    /// into the entry, so later changes to the caller's value do not leak in.
    pub async fn log_action(
        &self,
        actor: Option<&Actor>,
        action: AuditAction,
        entity_type: &str,
        entity_id: &str,
        entity_data: Option<&Value>,
    ) -> AuditOutcome {
        match self
            .append_audit(actor, action, entity_type, entity_id, entity_data)
            .await
        {
            Ok(id) => AuditOutcome::Recorded(id),
            Err(error) => {
                tracing::warn!(
                    %action,
                    entity_type,
                    entity_id,
                    %error,
                    "audit log write failed"
                );
                AuditOutcome::Failed(error.to_string())
            }
        }
    }

    async fn append_audit(
        &self,
        actor: Option<&Actor>,
        action: AuditAction,
        entity_type: &str,
        entity_id: &str,
        entity_data: Option<&Value>,
    ) -> Result<String, AdminError> {
        let system = Actor::system();
        let actor = actor.unwrap_or(&system);
        let entry = AuditEntry {
            id: generate_id(PREFIX_AUDIT)?,
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            action,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            entity_data: entity_data.cloned(),
            created_at: Utc::now(),
        };
        let record = entry_to_record(&entry)?;
        self.store()
            .insert_many(Table::AuditLogs, vec![record])
            .await?;
        tracing::debug!(id = %entry.id, %action, entity_type, entity_id, "audit entry recorded");
        Ok(entry.id)
    }

    async fn read_audit(&self, filter: Filter, limit: Option<usize>) -> Vec<AuditEntry> {
        let filter = filter
            .newest_first("createdAt")
            .limit(self.config().audit.clamp(limit));
        match self.store().find(Table::AuditLogs, &filter).await {
            Ok(records) => records_to_entries(records),
            Err(error) => {
                tracing::warn!(%error, "audit log read failed");
                Vec::new()
            }
        }
    }

    /// Entries about one entity, newest first.
    pub async fn logs_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
        limit: Option<usize>,
    ) -> Vec<AuditEntry> {
        let filter = Filter::all()
            .equals("entityType", entity_type)
            .equals("entityId", entity_id);
        self.read_audit(filter, limit).await
    }

    /// Most recent entries across all entities.
    pub async fn recent_logs(&self, limit: Option<usize>) -> Vec<AuditEntry> {
        self.read_audit(Filter::all(), limit).await
    }

    /// Entries recorded for one acting user, newest first.
    pub async fn logs_by_user(&self, user_id: &str, limit: Option<usize>) -> Vec<AuditEntry> {
        self.read_audit(Filter::all().equals("userId", user_id), limit)
            .await
    }
}

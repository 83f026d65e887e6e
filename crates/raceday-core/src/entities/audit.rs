use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AuditAction;

/// An append-only audit log entry recording an operation and who ran it.
///
/// `entity_data` is the JSON snapshot taken before the operation (or a
/// reduced payload such as `{"id": ...}` or a filter clause).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

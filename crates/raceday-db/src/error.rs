//! Error types for raceday-db.

use std::time::Duration;

use raceday_core::errors::CoreError;
use thiserror::Error;

/// Errors raised by an entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A statement failed or produced data that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A filter or update named a column outside the table's allow-list.
    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// A row violated a required-column, uniqueness, or foreign-key rule.
    #[error("Constraint violated on '{table}': {reason}")]
    Constraint { table: String, reason: String },

    /// The enclosing transaction did not finish in time and was rolled back.
    #[error("Transaction timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn constraint(table: &str, reason: impl Into<String>) -> Self {
        Self::Constraint {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<CoreError> for StoreError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::UnknownColumn { table, column } => Self::UnknownColumn { table, column },
            other => Self::Query(other.to_string()),
        }
    }
}

/// Errors surfaced by admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The actor lacks the role the operation requires. Raised before any read.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Malformed input: unreadable CSV header, unsupported backup version, and so on.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A restore transaction failed or timed out and was rolled back.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AdminError {
    pub(crate) fn unauthorized(operation: &str, required: &str) -> Self {
        Self::Unauthorized(format!("{operation} requires the {required} role"))
    }

    /// Re-label store failures that happened inside a restore transaction.
    #[must_use]
    pub fn into_transaction(self) -> Self {
        match self {
            Self::Store(e) => Self::Transaction(e.to_string()),
            other => other,
        }
    }
}

impl From<CoreError> for AdminError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            CoreError::UnknownTable(name) => Self::Validation(format!("unknown table '{name}'")),
            CoreError::Validation(msg) => Self::Validation(msg),
            other => Self::Store(StoreError::from(other)),
        }
    }
}

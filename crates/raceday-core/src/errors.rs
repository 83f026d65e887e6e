//! Cross-cutting error types for raceday.
//!
//! This module defines errors that can originate from any crate in the system.
//! Storage and service errors (`StoreError`, `AdminError`) live in `raceday-db`
//! and wrap these where they cross the boundary.

use thiserror::Error;

/// Errors that can be raised by any raceday crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A name did not match any managed table.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A column is not part of the table's allow-list.
    #[error("Unknown column '{column}' for table {table}")]
    UnknownColumn { table: String, column: String },

    /// Data failed validation (schema, format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

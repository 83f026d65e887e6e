//! Repository methods on [`crate::AdminService`].

pub mod audit;
pub mod safe_delete;

pub use audit::AuditOutcome;
pub use safe_delete::{BulkDeleted, DeleteOptions, Deleted, SoftDeleteChange};

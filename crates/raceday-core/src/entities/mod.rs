//! Typed views over stored rows.
//!
//! Most tables travel as untyped `Record`s described by their `TableSchema`.
//! Rows the service reasons about field-by-field get a struct here.

mod audit;

pub use audit::AuditEntry;

//! # raceday-db
//!
//! Storage and admin operations for the raceday back-office.
//!
//! - [`store`]: the `UnitOfWork`/`EntityStore` abstraction with a libSQL
//!   implementation and an in-memory one
//! - [`service::AdminService`]: the host for every admin operation, generic
//!   over the store
//! - [`repos`]: audit logging and audited deletion
//! - [`backup`]: export, restore (replace or merge), and daily auto-backups
//! - [`csv`]: payment-status import and registration export
//!
//! Uses the `libsql` crate (v0.9.29) for the persistent store.

pub mod backup;
pub mod csv;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod store;

pub use error::{AdminError, StoreError};
pub use service::AdminService;
pub use store::{EntityStore, MemoryStore, SqlStore, Transaction, UnitOfWork, UpsertOutcome};

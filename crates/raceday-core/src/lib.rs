//! # raceday-core
//!
//! Core types, table schemas, and error types for the raceday back-office.
//!
//! This crate provides the foundational types shared across all raceday crates:
//! - The managed table catalogue with explicit per-table column allow-lists
//! - `Record` and `Filter`, the store-neutral row and predicate shapes
//! - Audit actions, payment statuses, roles, and the request actor
//! - The `BackupDocument` envelope exchanged by export and restore
//! - Structured responses returned across the action boundary
//! - Cross-cutting error types

pub mod backup;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod record;
pub mod responses;
pub mod tables;

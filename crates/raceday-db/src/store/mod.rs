//! Entity store abstraction.
//!
//! Every admin operation talks to storage through [`UnitOfWork`]: fetch by id,
//! filtered reads, bulk insert, upsert, partial update, and filtered delete.
//! An [`EntityStore`] is a unit of work that auto-commits each call and can
//! open a [`Transaction`], which is a unit of work whose effects are only
//! visible after `commit`.
//!
//! Two implementations exist: [`SqlStore`] (libSQL) and [`MemoryStore`]
//! (tables held behind a tokio `RwLock`, with failure injection for tests).
//! Both enforce the same rules:
//!
//! - records are projected onto the table's column allow-list on write, so
//!   relation arrays and unknown keys are silently dropped
//! - filters and partial updates that name an unknown column are rejected
//! - required columns, unique ids, and declared foreign keys are checked
//! - a delete that would orphan child rows is rejected

pub mod memory;
pub mod sql;

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use raceday_core::record::{Filter, Record};
use raceday_core::tables::{Table, TableSchema};
use serde::Serialize;
use serde_json::Value;
use tokio::time::error::Elapsed;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Table-level operations shared by stores and open transactions.
pub trait UnitOfWork: Send + Sync {
    /// Read one row by primary id.
    fn fetch(
        &self,
        table: Table,
        id: &str,
    ) -> impl Future<Output = Result<Option<Record>, StoreError>> + Send;

    /// Read every row matching `filter`, honouring its ordering and limit.
    fn find(
        &self,
        table: Table,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    fn exists(
        &self,
        table: Table,
        id: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move { Ok(self.fetch(table, id).await?.is_some()) }
    }

    /// Insert rows, failing on the first constraint violation.
    fn insert_many(
        &self,
        table: Table,
        rows: Vec<Record>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Update the row with this id if it exists, insert it otherwise.
    ///
    /// On update, only the columns present in `row` change; an explicit null
    /// clears a column.
    fn upsert(
        &self,
        table: Table,
        id: &str,
        row: Record,
    ) -> impl Future<Output = Result<UpsertOutcome, StoreError>> + Send;

    /// Apply `changes` to one row. Returns `false` when no row has this id.
    fn update(
        &self,
        table: Table,
        id: &str,
        changes: Record,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Delete every row matching `filter`. Returns the number removed.
    fn delete(
        &self,
        table: Table,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// An open transaction.
pub trait Transaction: UnitOfWork {
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A store that auto-commits plain calls and can open transactions.
pub trait EntityStore: UnitOfWork {
    type Tx<'a>: Transaction
    where
        Self: 'a;

    fn begin(&self) -> impl Future<Output = Result<Self::Tx<'_>, StoreError>> + Send;
}

/// Commit or roll back `tx` according to the outcome of timed work.
///
/// `outcome` is what `tokio::time::timeout(limit, work(&tx))` produced. Work
/// that finished in time and succeeded is committed; anything else is rolled
/// back. An elapsed timer becomes [`StoreError::Timeout`].
///
/// # Errors
///
/// Returns the work's own error, a commit failure, or the timeout.
pub async fn settle<Tx, T, E>(
    tx: Tx,
    outcome: Result<Result<T, E>, Elapsed>,
    limit: Duration,
) -> Result<T, E>
where
    Tx: Transaction,
    E: From<StoreError> + fmt::Display,
{
    match outcome {
        Ok(Ok(value)) => {
            tx.commit().await?;
            Ok(value)
        }
        Ok(Err(error)) => {
            tracing::debug!(%error, "rolling back transaction");
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(%rollback, "rollback failed");
            }
            Err(error)
        }
        Err(_) => {
            tracing::warn!(limit_secs = limit.as_secs_f64(), "transaction timed out; rolling back");
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(%rollback, "rollback failed");
            }
            Err(StoreError::Timeout(limit).into())
        }
    }
}

// ---------------------------------------------------------------------------
// Rules shared by both stores
// ---------------------------------------------------------------------------

/// Reject filters that mention columns outside the allow-list.
pub(crate) fn check_filter(schema: &TableSchema, filter: &Filter) -> Result<(), StoreError> {
    for column in filter.columns() {
        schema.check_column(column)?;
    }
    Ok(())
}

/// Reject partial updates that mention unknown columns or try to change the id.
pub(crate) fn check_changes(schema: &TableSchema, changes: &Record) -> Result<(), StoreError> {
    for column in changes.keys() {
        schema.check_column(column)?;
        if column == "id" {
            return Err(StoreError::constraint(
                schema.table.as_str(),
                "the id column cannot be updated",
            ));
        }
    }
    Ok(())
}

/// Prepare a row for insertion: project, force the id, and check required columns.
pub(crate) fn prepare_insert(
    schema: &TableSchema,
    id: Option<&str>,
    row: &Record,
) -> Result<Record, StoreError> {
    let mut projected = schema.project(row);
    if let Some(id) = id {
        projected.insert("id".to_string(), Value::String(id.to_string()));
    }
    projected.retain(|_, v| !v.is_null());
    let missing = schema.missing_required(&projected);
    if !missing.is_empty() {
        return Err(StoreError::constraint(
            schema.table.as_str(),
            format!("missing required columns: {}", missing.join(", ")),
        ));
    }
    Ok(projected)
}

/// Total order over JSON scalars used for in-memory sorting.
///
/// Nulls sort first, numbers compare numerically, strings lexically.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

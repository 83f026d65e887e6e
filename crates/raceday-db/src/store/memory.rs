//! In-memory entity store.
//!
//! Tables live behind a tokio `RwLock`. A transaction takes the writer lock,
//! works on a private copy of every table, and swaps the copy in on commit;
//! rollback simply drops it. Auto-committed writes also take the writer lock,
//! so they never interleave with an open transaction.
//!
//! Tests can make deletes or updates on a table fail, or slow every write
//! down, to exercise the failure paths of the admin operations.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use raceday_core::record::{Filter, Record, record_id};
use raceday_core::tables::{Table, TableSchema};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use super::{
    EntityStore, Transaction, UnitOfWork, UpsertOutcome, check_changes, check_filter,
    compare_values, prepare_insert,
};
use crate::error::StoreError;

/// Injected failures and latency.
#[derive(Debug, Clone, Default)]
struct Faults {
    deletes: HashSet<Table>,
    updates: HashSet<Table>,
    write_delay: Option<Duration>,
}

impl Faults {
    async fn pause(&self) {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Rows per table, in insertion order.
#[derive(Debug, Clone, Default)]
struct Tables {
    rows: BTreeMap<Table, Vec<Record>>,
}

impl Tables {
    fn rows(&self, table: Table) -> &[Record] {
        self.rows.get(&table).map_or(&[], Vec::as_slice)
    }

    fn position(&self, table: Table, id: &str) -> Option<usize> {
        self.rows(table)
            .iter()
            .position(|row| record_id(row) == Some(id))
    }

    fn fetch(&self, table: Table, id: &str) -> Option<Record> {
        self.position(table, id).map(|i| self.rows(table)[i].clone())
    }

    fn find(&self, table: Table, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        check_filter(table.schema(), filter)?;
        let mut found: Vec<Record> = self
            .rows(table)
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        if let Some(order) = &filter.order_by {
            found.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.descending { ord.reverse() } else { ord }
            });
        }
        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    /// Every non-null foreign key in `row` must resolve.
    fn check_parents(&self, schema: &TableSchema, row: &Record) -> Result<(), StoreError> {
        for key in schema.foreign_keys {
            let Some(value) = row.get(key.column).filter(|v| !v.is_null()) else {
                continue;
            };
            let resolved = value
                .as_str()
                .is_some_and(|parent_id| self.position(key.parent, parent_id).is_some());
            if !resolved {
                return Err(StoreError::constraint(
                    schema.table.as_str(),
                    format!(
                        "foreign key {} = {value} has no row in {}",
                        key.column, key.parent
                    ),
                ));
            }
        }
        Ok(())
    }

    fn insert_many(&mut self, table: Table, rows: Vec<Record>) -> Result<u64, StoreError> {
        let schema = table.schema();
        let mut inserted = 0;
        for row in rows {
            let row = prepare_insert(schema, None, &row)?;
            self.insert_one(schema, row)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    fn insert_one(&mut self, schema: &TableSchema, row: Record) -> Result<(), StoreError> {
        let table = schema.table;
        let id = record_id(&row).unwrap_or_default().to_string();
        if self.position(table, &id).is_some() {
            return Err(StoreError::constraint(
                table.as_str(),
                format!("duplicate id {id}"),
            ));
        }
        self.check_parents(schema, &row)?;
        self.rows.entry(table).or_default().push(row);
        Ok(())
    }

    fn merge_into(&mut self, table: Table, index: usize, changes: Record) -> Result<(), StoreError> {
        let schema = table.schema();
        let mut merged = self.rows(table)[index].clone();
        for (column, value) in changes {
            if value.is_null() {
                merged.remove(&column);
            } else {
                merged.insert(column, value);
            }
        }
        let missing = schema.missing_required(&merged);
        if !missing.is_empty() {
            return Err(StoreError::constraint(
                table.as_str(),
                format!("missing required columns: {}", missing.join(", ")),
            ));
        }
        self.check_parents(schema, &merged)?;
        let merged = schema.project(&merged);
        if let Some(rows) = self.rows.get_mut(&table) {
            rows[index] = merged;
        }
        Ok(())
    }

    fn upsert(&mut self, table: Table, id: &str, row: &Record) -> Result<UpsertOutcome, StoreError> {
        let schema = table.schema();
        if let Some(index) = self.position(table, id) {
            let mut changes = schema.project(row);
            changes.remove("id");
            self.merge_into(table, index, changes)?;
            Ok(UpsertOutcome::Updated)
        } else {
            let row = prepare_insert(schema, Some(id), row)?;
            self.insert_one(schema, row)?;
            Ok(UpsertOutcome::Inserted)
        }
    }

    fn update(&mut self, table: Table, id: &str, changes: Record) -> Result<bool, StoreError> {
        check_changes(table.schema(), &changes)?;
        match self.position(table, id) {
            Some(index) => {
                self.merge_into(table, index, changes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        check_filter(table.schema(), filter)?;
        let doomed: HashSet<String> = self
            .rows(table)
            .iter()
            .filter(|row| filter.matches(row))
            .filter_map(|row| record_id(row).map(str::to_string))
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        for child in Table::ALL {
            for key in child.schema().foreign_keys.iter().filter(|k| k.parent == table) {
                let orphaned = self.rows(*child).iter().any(|row| {
                    row.get(key.column)
                        .and_then(Value::as_str)
                        .is_some_and(|parent_id| doomed.contains(parent_id))
                });
                if orphaned {
                    return Err(StoreError::constraint(
                        table.as_str(),
                        format!("rows are still referenced by {child}.{}", key.column),
                    ));
                }
            }
        }

        let rows = self.rows.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| record_id(row).is_none_or(|id| !doomed.contains(id)));
        Ok((before - rows.len()) as u64)
    }
}

/// Entity store that keeps every table in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    writer: Arc<Mutex<()>>,
    faults: Arc<RwLock<Faults>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delete on `table` fail.
    pub async fn fail_deletes_on(&self, table: Table) {
        self.faults.write().await.deletes.insert(table);
    }

    /// Make every partial update on `table` fail.
    pub async fn fail_updates_on(&self, table: Table) {
        self.faults.write().await.updates.insert(table);
    }

    /// Sleep before every write.
    pub async fn delay_writes(&self, delay: Duration) {
        self.faults.write().await.write_delay = Some(delay);
    }

    /// Remove every injected fault.
    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }

    /// Number of rows currently committed in `table`.
    pub async fn row_count(&self, table: Table) -> usize {
        self.tables.read().await.rows(table).len()
    }

    async fn faults(&self) -> Faults {
        self.faults.read().await.clone()
    }
}

fn injected(table: Table, operation: &str) -> StoreError {
    StoreError::Query(format!("injected {operation} failure on {table}"))
}

impl UnitOfWork for MemoryStore {
    async fn fetch(&self, table: Table, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.tables.read().await.fetch(table, id))
    }

    async fn find(&self, table: Table, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        self.tables.read().await.find(table, filter)
    }

    async fn insert_many(&self, table: Table, rows: Vec<Record>) -> Result<u64, StoreError> {
        self.faults().await.pause().await;
        let _writer = self.writer.lock().await;
        self.tables.write().await.insert_many(table, rows)
    }

    async fn upsert(&self, table: Table, id: &str, row: Record) -> Result<UpsertOutcome, StoreError> {
        self.faults().await.pause().await;
        let _writer = self.writer.lock().await;
        self.tables.write().await.upsert(table, id, &row)
    }

    async fn update(&self, table: Table, id: &str, changes: Record) -> Result<bool, StoreError> {
        let faults = self.faults().await;
        faults.pause().await;
        if faults.updates.contains(&table) {
            return Err(injected(table, "update"));
        }
        let _writer = self.writer.lock().await;
        self.tables.write().await.update(table, id, changes)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        let faults = self.faults().await;
        faults.pause().await;
        if faults.deletes.contains(&table) {
            return Err(injected(table, "delete"));
        }
        let _writer = self.writer.lock().await;
        self.tables.write().await.delete(table, filter)
    }
}

/// A transaction over a private copy of every table.
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    _writer: MutexGuard<'a, ()>,
    working: RwLock<Tables>,
    faults: Faults,
}

impl UnitOfWork for MemoryTransaction<'_> {
    async fn fetch(&self, table: Table, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.working.read().await.fetch(table, id))
    }

    async fn find(&self, table: Table, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        self.working.read().await.find(table, filter)
    }

    async fn insert_many(&self, table: Table, rows: Vec<Record>) -> Result<u64, StoreError> {
        self.faults.pause().await;
        self.working.write().await.insert_many(table, rows)
    }

    async fn upsert(&self, table: Table, id: &str, row: Record) -> Result<UpsertOutcome, StoreError> {
        self.faults.pause().await;
        self.working.write().await.upsert(table, id, &row)
    }

    async fn update(&self, table: Table, id: &str, changes: Record) -> Result<bool, StoreError> {
        self.faults.pause().await;
        if self.faults.updates.contains(&table) {
            return Err(injected(table, "update"));
        }
        self.working.write().await.update(table, id, changes)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        self.faults.pause().await;
        if self.faults.deletes.contains(&table) {
            return Err(injected(table, "delete"));
        }
        self.working.write().await.delete(table, filter)
    }
}

impl Transaction for MemoryTransaction<'_> {
    async fn commit(self) -> Result<(), StoreError> {
        let working = self.working.into_inner();
        *self.store.tables.write().await = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl EntityStore for MemoryStore {
    type Tx<'a> = MemoryTransaction<'a>;

    async fn begin(&self) -> Result<MemoryTransaction<'_>, StoreError> {
        let writer = self.writer.lock().await;
        let working = self.tables.read().await.clone();
        Ok(MemoryTransaction {
            store: self,
            _writer: writer,
            working: RwLock::new(working),
            faults: self.faults().await,
        })
    }
}

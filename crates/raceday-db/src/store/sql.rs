//! libSQL-backed entity store.
//!
//! One connection serves every call. Each operation is rendered to a single
//! statement over quoted camelCase identifiers with positional parameters;
//! values are converted per column kind by [`crate::helpers`].

use libsql::{Builder, Connection};
use raceday_core::record::{Condition, Filter, Record};
use raceday_core::tables::{Table, TableSchema};

use super::{
    EntityStore, Transaction, UnitOfWork, UpsertOutcome, check_changes, check_filter,
    prepare_insert,
};
use crate::error::StoreError;
use crate::helpers::{from_sql_value, quote_ident, to_sql_value};

/// Entity store over a local libSQL database.
pub struct SqlStore {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: Connection,
}

impl SqlStore {
    /// Open a local database file (or `":memory:"`) and run migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, StoreError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Per-connection in SQLite.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| StoreError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn write_error(table: Table, error: libsql::Error) -> StoreError {
    let message = error.to_string();
    if message.contains("constraint failed") {
        StoreError::constraint(table.as_str(), message)
    } else {
        StoreError::LibSql(error)
    }
}

fn column_list(schema: &TableSchema) -> String {
    schema
        .column_names()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_param(
    schema: &TableSchema,
    column: &str,
    value: &serde_json::Value,
    params: &mut Vec<libsql::Value>,
) -> Result<String, StoreError> {
    let col = schema.check_column(column)?;
    params.push(to_sql_value(schema.table, col, value)?);
    Ok(format!("?{}", params.len()))
}

fn condition_sql(
    schema: &TableSchema,
    condition: &Condition,
    params: &mut Vec<libsql::Value>,
) -> Result<String, StoreError> {
    let sql = match condition {
        Condition::Eq { column, value } => {
            if value.is_null() {
                // Eq never matches null.
                "0".to_string()
            } else {
                let slot = push_param(schema, column, value, params)?;
                format!("{} = {slot}", quote_ident(column))
            }
        }
        Condition::In { column, values } => {
            let mut slots = Vec::with_capacity(values.len());
            for value in values.iter().filter(|v| !v.is_null()) {
                slots.push(push_param(schema, column, value, params)?);
            }
            if slots.is_empty() {
                "0".to_string()
            } else {
                format!("{} IN ({})", quote_ident(column), slots.join(", "))
            }
        }
        Condition::IsNull { column } => format!("{} IS NULL", quote_ident(column)),
        Condition::NotNull { column } => format!("{} IS NOT NULL", quote_ident(column)),
    };
    Ok(sql)
}

fn where_clause(
    schema: &TableSchema,
    filter: &Filter,
    params: &mut Vec<libsql::Value>,
) -> Result<String, StoreError> {
    if filter.conditions.is_empty() {
        return Ok(String::new());
    }
    let parts = filter
        .conditions
        .iter()
        .map(|c| condition_sql(schema, c, params))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

fn decode_row(schema: &TableSchema, row: &libsql::Row) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for (idx, column) in (0_i32..).zip(schema.columns) {
        let value = from_sql_value(schema.table, column, row.get_value(idx)?)?;
        if !value.is_null() {
            record.insert(column.name.to_string(), value);
        }
    }
    Ok(record)
}

async fn find_on(conn: &Connection, table: Table, filter: &Filter) -> Result<Vec<Record>, StoreError> {
    let schema = table.schema();
    check_filter(schema, filter)?;

    let mut params = Vec::new();
    let mut sql = format!(
        "SELECT {} FROM {}{}",
        column_list(schema),
        quote_ident(table.as_str()),
        where_clause(schema, filter, &mut params)?
    );
    if let Some(order) = &filter.order_by {
        let direction = if order.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {} {direction}", quote_ident(&order.column)));
    }
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut rows = conn.query(&sql, libsql::params_from_iter(params)).await?;
    let mut found = Vec::new();
    while let Some(row) = rows.next().await? {
        found.push(decode_row(schema, &row)?);
    }
    Ok(found)
}

async fn fetch_on(conn: &Connection, table: Table, id: &str) -> Result<Option<Record>, StoreError> {
    let mut found = find_on(conn, table, &Filter::by_id(id).limit(1)).await?;
    Ok(found.pop())
}

/// Insert an already prepared row.
async fn insert_prepared(conn: &Connection, table: Table, row: &Record) -> Result<(), StoreError> {
    let schema = table.schema();
    let mut names = Vec::with_capacity(row.len());
    let mut slots = Vec::with_capacity(row.len());
    let mut params = Vec::with_capacity(row.len());
    for (column, value) in row {
        slots.push(push_param(schema, column, value, &mut params)?);
        names.push(quote_ident(column));
    }
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table.as_str()),
        names.join(", "),
        slots.join(", ")
    );
    conn.execute(&sql, libsql::params_from_iter(params))
        .await
        .map_err(|e| write_error(table, e))?;
    Ok(())
}

async fn insert_many_on(conn: &Connection, table: Table, rows: Vec<Record>) -> Result<u64, StoreError> {
    let schema = table.schema();
    let mut inserted = 0;
    for row in rows {
        let row = prepare_insert(schema, None, &row)?;
        insert_prepared(conn, table, &row).await?;
        inserted += 1;
    }
    Ok(inserted)
}

/// `UPDATE ... SET` for the given columns. Returns whether a row matched.
async fn update_columns(
    conn: &Connection,
    table: Table,
    id: &str,
    changes: &Record,
) -> Result<bool, StoreError> {
    let schema = table.schema();
    if changes.is_empty() {
        return Ok(fetch_on(conn, table, id).await?.is_some());
    }
    let mut params = Vec::with_capacity(changes.len() + 1);
    let mut sets = Vec::with_capacity(changes.len());
    for (column, value) in changes {
        let slot = push_param(schema, column, value, &mut params)?;
        sets.push(format!("{} = {slot}", quote_ident(column)));
    }
    params.push(libsql::Value::Text(id.to_string()));
    let sql = format!(
        "UPDATE {} SET {} WHERE \"id\" = ?{}",
        quote_ident(table.as_str()),
        sets.join(", "),
        params.len()
    );
    let affected = conn
        .execute(&sql, libsql::params_from_iter(params))
        .await
        .map_err(|e| write_error(table, e))?;
    Ok(affected > 0)
}

async fn upsert_on(
    conn: &Connection,
    table: Table,
    id: &str,
    row: &Record,
) -> Result<UpsertOutcome, StoreError> {
    let schema = table.schema();
    if fetch_on(conn, table, id).await?.is_some() {
        let mut changes = schema.project(row);
        changes.remove("id");
        update_columns(conn, table, id, &changes).await?;
        Ok(UpsertOutcome::Updated)
    } else {
        let row = prepare_insert(schema, Some(id), row)?;
        insert_prepared(conn, table, &row).await?;
        Ok(UpsertOutcome::Inserted)
    }
}

async fn update_on(
    conn: &Connection,
    table: Table,
    id: &str,
    changes: &Record,
) -> Result<bool, StoreError> {
    check_changes(table.schema(), changes)?;
    update_columns(conn, table, id, changes).await
}

async fn delete_on(conn: &Connection, table: Table, filter: &Filter) -> Result<u64, StoreError> {
    let schema = table.schema();
    check_filter(schema, filter)?;
    let mut params = Vec::new();
    let sql = format!(
        "DELETE FROM {}{}",
        quote_ident(table.as_str()),
        where_clause(schema, filter, &mut params)?
    );
    conn.execute(&sql, libsql::params_from_iter(params))
        .await
        .map_err(|e| write_error(table, e))
}

impl UnitOfWork for SqlStore {
    async fn fetch(&self, table: Table, id: &str) -> Result<Option<Record>, StoreError> {
        fetch_on(&self.conn, table, id).await
    }

    async fn find(&self, table: Table, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        find_on(&self.conn, table, filter).await
    }

    async fn insert_many(&self, table: Table, rows: Vec<Record>) -> Result<u64, StoreError> {
        insert_many_on(&self.conn, table, rows).await
    }

    async fn upsert(&self, table: Table, id: &str, row: Record) -> Result<UpsertOutcome, StoreError> {
        upsert_on(&self.conn, table, id, &row).await
    }

    async fn update(&self, table: Table, id: &str, changes: Record) -> Result<bool, StoreError> {
        update_on(&self.conn, table, id, &changes).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        delete_on(&self.conn, table, filter).await
    }
}

/// An open libSQL transaction.
pub struct SqlTransaction {
    tx: libsql::Transaction,
}

impl UnitOfWork for SqlTransaction {
    async fn fetch(&self, table: Table, id: &str) -> Result<Option<Record>, StoreError> {
        fetch_on(&self.tx, table, id).await
    }

    async fn find(&self, table: Table, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        find_on(&self.tx, table, filter).await
    }

    async fn insert_many(&self, table: Table, rows: Vec<Record>) -> Result<u64, StoreError> {
        insert_many_on(&self.tx, table, rows).await
    }

    async fn upsert(&self, table: Table, id: &str, row: Record) -> Result<UpsertOutcome, StoreError> {
        upsert_on(&self.tx, table, id, &row).await
    }

    async fn update(&self, table: Table, id: &str, changes: Record) -> Result<bool, StoreError> {
        update_on(&self.tx, table, id, &changes).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        delete_on(&self.tx, table, filter).await
    }
}

impl Transaction for SqlTransaction {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

impl EntityStore for SqlStore {
    type Tx<'a> = SqlTransaction;

    async fn begin(&self) -> Result<SqlTransaction, StoreError> {
        let tx = self.conn.transaction().await?;
        Ok(SqlTransaction { tx })
    }
}

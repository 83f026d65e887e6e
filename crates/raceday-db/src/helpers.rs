//! Conversions between JSON record values and libSQL values.
//!
//! Column kinds decide the storage class: JSON is serialized TEXT, booleans
//! are INTEGER 0/1, timestamps are RFC 3339 TEXT. Whole-number REAL values
//! decode to JSON integers so `42` survives a write/read cycle unchanged.

use chrono::{DateTime, SecondsFormat, Utc};
use raceday_core::tables::{Column, ColumnKind, Table};
use serde_json::{Number, Value};

use crate::error::StoreError;

/// Quote an identifier for SQL. Column and table names are camelCase.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Format a timestamp the way every writer in this crate stores it.
///
/// Fixed-width microseconds keep lexical and chronological order aligned.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn type_error(table: Table, column: &Column, value: &Value) -> StoreError {
    StoreError::Query(format!(
        "{table}.{} expects {:?}, got {value}",
        column.name, column.kind
    ))
}

/// Encode a JSON value for a column.
///
/// # Errors
///
/// Returns `StoreError::Query` when the value cannot be stored in the column's kind.
pub fn to_sql_value(table: Table, column: &Column, value: &Value) -> Result<libsql::Value, StoreError> {
    if value.is_null() {
        return Ok(libsql::Value::Null);
    }
    let encoded = match column.kind {
        ColumnKind::Json => libsql::Value::Text(serde_json::to_string(value)?),
        ColumnKind::Text | ColumnKind::Timestamp => match value {
            Value::String(s) => libsql::Value::Text(s.clone()),
            Value::Number(_) | Value::Bool(_) => libsql::Value::Text(value.to_string()),
            _ => return Err(type_error(table, column, value)),
        },
        ColumnKind::Integer => match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => libsql::Value::Integer(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => {
                        #[allow(clippy::cast_possible_truncation)]
                        libsql::Value::Integer(f as i64)
                    }
                    _ => return Err(type_error(table, column, value)),
                },
            },
            Value::Bool(b) => libsql::Value::Integer(i64::from(*b)),
            Value::String(s) => s
                .trim()
                .parse()
                .map(libsql::Value::Integer)
                .map_err(|_| type_error(table, column, value))?,
            _ => return Err(type_error(table, column, value)),
        },
        ColumnKind::Real => match value {
            Value::Number(n) => n
                .as_f64()
                .map(libsql::Value::Real)
                .ok_or_else(|| type_error(table, column, value))?,
            Value::String(s) => s
                .trim()
                .parse()
                .map(libsql::Value::Real)
                .map_err(|_| type_error(table, column, value))?,
            _ => return Err(type_error(table, column, value)),
        },
        ColumnKind::Bool => match value {
            Value::Bool(b) => libsql::Value::Integer(i64::from(*b)),
            Value::Number(n) => libsql::Value::Integer(i64::from(n.as_f64().is_some_and(|f| f != 0.0))),
            _ => return Err(type_error(table, column, value)),
        },
    };
    Ok(encoded)
}

/// Decode a stored value back into JSON.
///
/// # Errors
///
/// Returns `StoreError::Query` for BLOBs or unparseable JSON text.
pub fn from_sql_value(table: Table, column: &Column, value: libsql::Value) -> Result<Value, StoreError> {
    let decoded = match (column.kind, value) {
        (_, libsql::Value::Null) => Value::Null,
        (ColumnKind::Json, libsql::Value::Text(text)) => serde_json::from_str(&text).map_err(|e| {
            StoreError::Query(format!("invalid JSON in {table}.{}: {e}", column.name))
        })?,
        (ColumnKind::Bool, libsql::Value::Integer(i)) => Value::Bool(i != 0),
        (_, libsql::Value::Integer(i)) => Value::Number(Number::from(i)),
        (_, libsql::Value::Real(f)) => real_to_json(f),
        (_, libsql::Value::Text(text)) => Value::String(text),
        (_, libsql::Value::Blob(_)) => {
            return Err(StoreError::Query(format!(
                "unexpected BLOB in {table}.{}",
                column.name
            )));
        }
    };
    Ok(decoded)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn real_to_json(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Value::Number(Number::from(f as i64))
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

//! Document normalization ahead of a restore.
//!
//! Accepts both the flat shape written by this crate and the older shape
//! that nests relation arrays inside parent rows (`events[].distances[]`,
//! `distances[].priceTiers[]`, `orders[].items[]`). Nested children are
//! hoisted into their own table with the back-reference filled in. When a
//! row with the same id also appears at the top level, the nested copy wins.
//! Every row is then projected onto its table's column allow-list.

use std::collections::BTreeMap;

use raceday_core::backup::BackupDocument;
use raceday_core::record::{Record, record_id};
use raceday_core::tables::{EMBEDDINGS, Embedding, Table};
use serde_json::Value;

/// Rows ready for restore, in parent-before-child order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub tables: Vec<(Table, Vec<Record>)>,
    pub warnings: Vec<String>,
}

impl Normalized {
    /// Rows for one table (empty when the document has none).
    #[must_use]
    pub fn rows(&self, table: Table) -> &[Record] {
        self.tables
            .iter()
            .find(|(t, _)| *t == table)
            .map_or(&[], |(_, rows)| rows.as_slice())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|(_, rows)| rows.len()).sum()
    }
}

/// Flatten and project a document.
#[must_use]
pub fn normalize_document(document: &BackupDocument) -> Normalized {
    let mut warnings = Vec::new();
    let mut tables: BTreeMap<Table, Vec<Record>> = BTreeMap::new();

    for (key, rows) in &document.data {
        match key.parse::<Table>() {
            Ok(table) if table.is_backed_up() => {
                tables.entry(table).or_default().extend(rows.iter().cloned());
            }
            Ok(table) => warnings.push(format!(
                "{table} is not restored from backups ({} rows ignored)",
                rows.len()
            )),
            Err(_) => warnings.push(format!("unknown table '{key}' ignored ({} rows)", rows.len())),
        }
    }

    for embedding in EMBEDDINGS {
        hoist(&mut tables, embedding, &mut warnings);
    }

    let tables = Table::RESTORE_ORDER
        .iter()
        .filter_map(|table| {
            let rows = tables.remove(table)?;
            let schema = table.schema();
            Some((*table, rows.iter().map(|row| schema.project(row)).collect()))
        })
        .collect();

    Normalized { tables, warnings }
}

/// Move nested child arrays out of parent rows into the child table.
fn hoist(tables: &mut BTreeMap<Table, Vec<Record>>, embedding: &Embedding, warnings: &mut Vec<String>) {
    let Some(parents) = tables.get_mut(&embedding.parent) else {
        return;
    };

    let mut nested = Vec::new();
    for parent in parents.iter_mut() {
        let parent_id = record_id(parent).map(str::to_string);
        match parent.remove(embedding.key) {
            Some(Value::Array(children)) => {
                for child in children {
                    let Value::Object(mut child) = child else {
                        warnings.push(format!(
                            "{}.{}: ignored a nested entry that is not an object",
                            embedding.parent, embedding.key
                        ));
                        continue;
                    };
                    let unset = child
                        .get(embedding.foreign_key)
                        .is_none_or(Value::is_null);
                    if let (true, Some(id)) = (unset, &parent_id) {
                        child.insert(embedding.foreign_key.to_string(), Value::String(id.clone()));
                    }
                    nested.push(child);
                }
            }
            // Anything else under the relation key is not a persisted column.
            Some(_) | None => {}
        }
    }

    if nested.is_empty() {
        return;
    }
    tracing::debug!(
        parent = %embedding.parent,
        child = %embedding.child,
        count = nested.len(),
        "hoisting nested rows"
    );
    let top_level = tables.entry(embedding.child).or_default();
    for child in nested {
        let existing = record_id(&child)
            .and_then(|id| top_level.iter().position(|row| record_id(row) == Some(id)));
        match existing {
            Some(index) => top_level[index] = child,
            None => top_level.push(child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use raceday_core::backup::BackupMetadata;
    use serde_json::json;

    fn document(data: Value) -> BackupDocument {
        serde_json::from_value(json!({
            "metadata": {"timestamp": "2025-06-01T00:00:00Z", "version": "1.0"},
            "data": data
        }))
        .unwrap()
    }

    #[test]
    fn nested_relations_are_hoisted_with_back_references() {
        let doc = document(json!({
            "events": [{
                "id": "evt-1", "title": "Run",
                "distances": [{
                    "id": "dst-1", "name": "10K",
                    "event": {"id": "evt-1"},
                    "priceTiers": [{"id": "prt-1", "name": "Early", "price": 5000}]
                }]
            }],
            "orders": [{"id": "ord-1", "items": [{"id": "itm-1", "quantity": 1}], "user": null}]
        }));
        let normalized = normalize_document(&doc);

        assert!(normalized.warnings.is_empty(), "{:?}", normalized.warnings);
        assert_eq!(
            Value::Object(normalized.rows(Table::Events)[0].clone()),
            json!({"id": "evt-1", "title": "Run"})
        );
        assert_eq!(
            Value::Object(normalized.rows(Table::Distances)[0].clone()),
            json!({"id": "dst-1", "eventId": "evt-1", "name": "10K"})
        );
        assert_eq!(normalized.rows(Table::PriceTiers)[0]["distanceId"], json!("dst-1"));
        assert_eq!(normalized.rows(Table::OrderItems)[0]["orderId"], json!("ord-1"));
    }

    #[test]
    fn nested_copy_wins_over_top_level() {
        let doc = document(json!({
            "orders": [{"id": "ord-1", "items": [{"id": "itm-1", "quantity": 3}]}],
            "orderItems": [
                {"id": "itm-1", "orderId": "ord-1", "quantity": 1},
                {"id": "itm-2", "orderId": "ord-1", "quantity": 2}
            ]
        }));
        let normalized = normalize_document(&doc);
        let items = normalized.rows(Table::OrderItems);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["quantity"], json!(3));
        assert_eq!(items[1]["id"], json!("itm-2"));
    }

    #[test]
    fn tables_come_out_in_restore_order() {
        let doc = document(json!({
            "orderItems": [], "users": [], "sellers": [], "registrations": []
        }));
        let order: Vec<Table> = normalize_document(&doc).tables.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            order,
            vec![Table::Sellers, Table::Users, Table::Registrations, Table::OrderItems]
        );
    }

    #[test]
    fn unknown_and_excluded_tables_become_warnings() {
        let doc = document(json!({
            "coupons": [{"id": "c1"}],
            "auditLogs": [{"id": "aud-1"}],
            "users": [{"id": "usr-1", "email": "a@x", "role": "USER", "accounts": []}]
        }));
        let normalized = normalize_document(&doc);
        assert_eq!(normalized.row_count(), 1);
        assert_eq!(normalized.warnings.len(), 2);
        assert!(normalized.warnings.iter().any(|w| w.contains("coupons")));
        assert!(!normalized.rows(Table::Users)[0].contains_key("accounts"));
    }

    #[test]
    fn flat_document_is_untouched_apart_from_projection() {
        let mut doc = BackupDocument::new(BackupMetadata::new(
            "2026-01-01T00:00:00Z".parse().unwrap(),
            "2.0",
            "raceday",
        ));
        let row = json!({"id": "sel-1", "name": "Shop"}).as_object().cloned().unwrap();
        doc.set_rows(Table::Sellers, vec![row.clone()]);
        let normalized = normalize_document(&doc);
        assert_eq!(normalized.tables, vec![(Table::Sellers, vec![row])]);
    }
}

//! Shared fixtures for the raceday-db integration tests.

#![allow(dead_code)]

use std::path::Path;

use raceday_config::RacedayConfig;
use raceday_core::enums::Role;
use raceday_core::identity::Actor;
use raceday_core::record::{Filter, Record, record_id};
use raceday_core::tables::Table;
use raceday_db::store::UnitOfWork;
use raceday_db::{AdminService, MemoryStore, SqlStore};
use serde_json::{Value, json};

pub fn admin() -> Actor {
    Actor::new("usr-1", "Ada Admin", Role::Admin)
}

pub fn staff() -> Actor {
    Actor::new("usr-3", "Sam Staff", Role::Staff)
}

pub fn runner() -> Actor {
    Actor::new("usr-2", "Rita Runner", Role::User)
}

pub fn rec(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

/// Default configuration with auto-backups written under `dir`.
pub fn config_in(dir: &Path) -> RacedayConfig {
    let mut config = RacedayConfig::default();
    config.backup.dir = dir.join("daily").to_string_lossy().into_owned();
    config
}

pub fn memory_service() -> AdminService<MemoryStore> {
    AdminService::new(MemoryStore::new(), RacedayConfig::default())
}

pub async fn sql_service() -> AdminService<SqlStore> {
    let store = SqlStore::open_local(":memory:").await.unwrap();
    AdminService::new(store, RacedayConfig::default())
}

/// Number of registrations created by [`seed`].
pub const REGISTRATIONS: usize = 10;

pub fn registration_id(n: usize) -> String {
    format!("reg-{n:02}")
}

/// A small but complete data set touching every foreign key path.
pub async fn seed<U: UnitOfWork>(store: &U) {
    let batches: Vec<(Table, Vec<Value>)> = vec![
        (Table::Sellers, vec![json!({"id": "sel-1", "name": "Race Shop Kft.", "taxNumber": "12345678-2-42"})]),
        (
            Table::MembershipTiers,
            vec![json!({"id": "mt-1", "name": "Gold", "price": 12000, "discountPercent": 12.5, "active": true})],
        ),
        (
            Table::Products,
            vec![json!({"id": "prd-1", "sellerId": "sel-1", "name": "Cap", "slug": "cap", "price": 2500,
                        "images": ["cap-front.jpg"], "active": true})],
        ),
        (Table::GlobalSettings, vec![json!({"id": "set-1", "key": "registrationOpen", "value": {"enabled": true}})]),
        (
            Table::Users,
            vec![
                json!({"id": "usr-1", "name": "Ada Admin", "email": "ada@example.com", "role": "ADMIN",
                       "membershipTierId": "mt-1"}),
                json!({"id": "usr-2", "name": "Rita Runner", "email": "rita@example.com", "role": "USER"}),
            ],
        ),
        (
            Table::Events,
            vec![json!({"id": "evt-1", "organizerId": "usr-1", "sellerId": "sel-1", "title": "City Run",
                        "slug": "city-run", "startDate": "2026-05-01T07:00:00.000000Z", "published": true,
                        "formConfig": {"fields": ["tshirt", "club"]}})],
        ),
        (
            Table::Distances,
            vec![
                json!({"id": "dst-1", "eventId": "evt-1", "name": "Half marathon", "lengthKm": 21.1, "capacity": 500}),
                json!({"id": "dst-2", "eventId": "evt-1", "name": "10K", "lengthKm": 10, "capacity": 800}),
            ],
        ),
        (
            Table::PriceTiers,
            vec![json!({"id": "prt-1", "distanceId": "dst-1", "name": "Early bird", "price": 9900})],
        ),
        (
            Table::Orders,
            vec![json!({"id": "ord-1", "userId": "usr-2", "email": "rita@example.com", "total": 5000,
                        "paymentStatus": "PENDING", "status": "NEW",
                        "shippingAddress": {"city": "Budapest", "zip": "1011"}})],
        ),
        (
            Table::OrderItems,
            vec![json!({"id": "itm-1", "orderId": "ord-1", "productId": "prd-1", "productName": "Cap",
                        "quantity": 2, "unitPrice": 2500})],
        ),
    ];
    for (table, rows) in batches {
        store
            .insert_many(table, rows.into_iter().map(rec).collect())
            .await
            .unwrap();
    }

    let registrations = (1..=REGISTRATIONS)
        .map(|n| {
            let user = if n == 1 { json!("usr-2") } else { Value::Null };
            let distance = if n % 2 == 0 { "dst-2" } else { "dst-1" };
            rec(json!({
                "id": registration_id(n),
                "userId": user,
                "eventId": "evt-1",
                "distanceId": distance,
                "firstName": format!("Runner{n}"),
                "lastName": "Kovács",
                "email": format!("runner{n}@example.com"),
                "price": 9900,
                "paymentStatus": "PENDING",
                "status": "CONFIRMED",
                "formData": {"tshirt": "M", "club": format!("Club {n}")},
                "createdAt": format!("2026-03-{n:02}T10:00:00.000000Z"),
            }))
        })
        .collect();
    store
        .insert_many(Table::Registrations, registrations)
        .await
        .unwrap();
}

/// Every backed-up table's rows, sorted by id, for whole-store comparisons.
pub async fn snapshot<U: UnitOfWork>(store: &U) -> Vec<(Table, Vec<Record>)> {
    let mut out = Vec::new();
    for table in Table::RESTORE_ORDER {
        let mut rows = store.find(*table, &Filter::all()).await.unwrap();
        rows.sort_by(|a, b| record_id(a).cmp(&record_id(b)));
        out.push((*table, rows));
    }
    out
}

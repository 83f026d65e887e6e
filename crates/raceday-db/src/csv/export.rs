//! Registration export for spreadsheet tools.
//!
//! Output is built for Excel: UTF-8 BOM, a `sep=;` hint line, `;` between
//! fields, `\r\n` line endings, and every field quoted.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use raceday_core::identity::Actor;
use raceday_core::record::{Filter, Record, record_id};
use raceday_core::responses::CsvExport;
use raceday_core::tables::{DELETED_AT, Table};
use serde_json::Value;

use super::dialect::excel_writer;
use crate::error::AdminError;
use crate::service::{AdminService, require_staff};
use crate::store::{EntityStore, UnitOfWork};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// BOM plus the delimiter hint Excel reads before the header.
const PREAMBLE: &str = "\u{feff}sep=;\r\n";

/// Where a fixed column takes its value from.
enum Source {
    Column(&'static str),
    DistanceName,
}

/// Leading columns, in output order.
const FIXED_COLUMNS: &[(&str, Source)] = &[
    ("ID", Source::Column("id")),
    ("Last name", Source::Column("lastName")),
    ("First name", Source::Column("firstName")),
    ("Email", Source::Column("email")),
    ("Phone", Source::Column("phone")),
    ("Birth date", Source::Column("birthDate")),
    ("Gender", Source::Column("gender")),
    ("Country", Source::Column("country")),
    ("Zip code", Source::Column("zipCode")),
    ("City", Source::Column("city")),
    ("Address", Source::Column("address")),
    ("Distance", Source::DistanceName),
    ("Price", Source::Column("price")),
    ("Payment status", Source::Column("paymentStatus")),
    ("Status", Source::Column("status")),
    ("Emergency contact name", Source::Column("emergencyName")),
    ("Emergency contact phone", Source::Column("emergencyPhone")),
    ("Registered at", Source::Column("createdAt")),
    ("Billing name", Source::Column("billingName")),
    ("Billing zip code", Source::Column("billingZipCode")),
    ("Billing city", Source::Column("billingCity")),
    ("Billing address", Source::Column("billingAddress")),
    ("Billing tax number", Source::Column("billingTaxNumber")),
];

/// `formData` keys that duplicate a fixed column or are form plumbing.
const FORM_DATA_DENY: &[&str] = &[
    "id",
    "eventId",
    "distanceId",
    "firstName",
    "lastName",
    "email",
    "phone",
    "birthDate",
    "gender",
    "country",
    "zipCode",
    "city",
    "address",
    "emergencyName",
    "emergencyPhone",
    "billingName",
    "billingZipCode",
    "billingCity",
    "billingAddress",
    "billingTaxNumber",
    "acceptTerms",
    "acceptPrivacy",
];

/// Download name for an event's export.
#[must_use]
pub fn export_filename(slug: &str, today: NaiveDate) -> String {
    format!("registrations-{slug}-{}.csv", today.format("%Y-%m-%d"))
}

/// The free-form form answers of a registration. Older rows store them as
/// JSON text.
fn form_data(registration: &Record) -> Option<Record> {
    match registration.get("formData")? {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) => serde_json::from_str(text).ok(),
        _ => None,
    }
}

/// Plain text for a cell. Objects and arrays are written as JSON.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render registrations into the CSV body.
fn render(
    registrations: &[Record],
    distance_names: &BTreeMap<String, String>,
) -> Result<String, AdminError> {
    let answers: Vec<Option<Record>> = registrations.iter().map(form_data).collect();
    let dynamic: BTreeSet<String> = answers
        .iter()
        .flatten()
        .flat_map(|map| map.keys().cloned())
        .filter(|key| !FORM_DATA_DENY.contains(&key.as_str()))
        .collect();

    let mut out = Vec::new();
    out.extend_from_slice(PREAMBLE.as_bytes());
    let mut writer = excel_writer(out);
    writer.write_record(
        FIXED_COLUMNS
            .iter()
            .map(|(title, _)| (*title).to_string())
            .chain(dynamic.iter().cloned()),
    )?;

    for (registration, answers) in registrations.iter().zip(&answers) {
        let fixed = FIXED_COLUMNS.iter().map(|(_, source)| match source {
            Source::Column(column) => cell_text(registration.get(*column)),
            Source::DistanceName => registration
                .get("distanceId")
                .and_then(Value::as_str)
                .and_then(|id| distance_names.get(id))
                .cloned()
                .unwrap_or_default(),
        });
        let extra = dynamic
            .iter()
            .map(|key| cell_text(answers.as_ref().and_then(|map| map.get(key))));
        writer.write_record(fixed.chain(extra))?;
    }

    let bytes = writer.into_inner().map_err(|e| AdminError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl<S: EntityStore> AdminService<S> {
    /// Export every live registration of the event with `slug`, newest first.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless the actor is staff or admin, `NotFound` for an
    /// unknown slug, or a store error.
    pub async fn export_registrations(
        &self,
        actor: &Actor,
        slug: &str,
        today: NaiveDate,
    ) -> Result<CsvExport, AdminError> {
        require_staff(actor, "registration export")?;

        let event = self
            .store()
            .find(Table::Events, &Filter::all().equals("slug", slug).limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AdminError::NotFound {
                entity: Table::Events.entity_name().to_string(),
                id: slug.to_string(),
            })?;
        let event_id = record_id(&event).unwrap_or_default();

        let distances = self
            .store()
            .find(Table::Distances, &Filter::all().equals("eventId", event_id))
            .await?;
        let distance_names: BTreeMap<String, String> = distances
            .iter()
            .filter_map(|d| Some((record_id(d)?.to_string(), cell_text(d.get("name")))))
            .collect();

        let registrations = if distance_names.is_empty() {
            Vec::new()
        } else {
            let ids = distance_names.keys().cloned().map(Value::String).collect();
            let filter = Filter::all()
                .any_of("distanceId", ids)
                .is_null(DELETED_AT)
                .newest_first("createdAt");
            self.store().find(Table::Registrations, &filter).await?
        };

        let body = render(&registrations, &distance_names)?;
        tracing::info!(actor = %actor.id, slug, rows = registrations.len(), "registrations exported");
        Ok(CsvExport {
            filename: export_filename(slug, today),
            content_type: CSV_CONTENT_TYPE.to_string(),
            rows: registrations.len(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn header_has_fixed_then_sorted_dynamic_columns() {
        let regs = vec![
            rec(json!({"id": "reg-1", "distanceId": "dst-1", "formData": {"tshirt": "M", "email": "dup"}})),
            rec(json!({"id": "reg-2", "distanceId": "dst-1", "formData": "{\"club\": \"Runners\"}"})),
        ];
        let names = BTreeMap::from([("dst-1".to_string(), "Half".to_string())]);
        let body = render(&regs, &names).unwrap();
        let lines: Vec<&str> = body.split("\r\n").collect();

        assert!(lines[0].starts_with('\u{feff}'));
        assert_eq!(lines[0], "\u{feff}sep=;");
        assert!(lines[1].starts_with("\"ID\";\"Last name\";\"First name\""));
        assert!(lines[1].ends_with("\"Billing tax number\";\"club\";\"tshirt\""));
        assert!(lines[2].contains("\"Half\""));
        assert!(lines[2].ends_with(";\"\";\"M\""));
        assert!(lines[3].ends_with(";\"Runners\";\"\""));
        assert_eq!(lines[4], "");
    }

    #[test]
    fn cells_quote_and_stringify() {
        assert_eq!(cell_text(Some(&json!({"size": "L"}))), "{\"size\":\"L\"}");
        assert_eq!(cell_text(Some(&json!(12900))), "12900");
        assert_eq!(cell_text(None), "");
    }

    #[test]
    fn quotes_inside_cells_are_doubled() {
        let regs = vec![rec(json!({"id": "reg-1", "lastName": "O\"Neil", "city": "Pécs; HU"}))];
        let body = render(&regs, &BTreeMap::new()).unwrap();
        let row = body.split("\r\n").nth(2).unwrap();
        assert!(row.starts_with("\"reg-1\";\"O\"\"Neil\";"), "{row}");
        assert!(row.contains(";\"Pécs; HU\";"), "{row}");
    }

    #[test]
    fn filename_pattern() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(export_filename("city-run", day), "registrations-city-run-2026-10-19.csv");
    }
}

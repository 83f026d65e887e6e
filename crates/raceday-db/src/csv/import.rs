//! Payment-status import from spreadsheet CSV exports.
//!
//! The header decides the delimiter: each candidate is tried in turn and the
//! first one whose header yields both an id column and a payment-status
//! column wins. Data rows are processed best-effort. A malformed row, an
//! unknown status, or a failed update is counted and reported, and the
//! remaining rows still go through.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use raceday_core::enums::{AuditAction, PaymentStatus};
use raceday_core::identity::Actor;
use raceday_core::record::Record;
use raceday_core::responses::ImportReport;
use raceday_core::tables::Table;
use serde_json::{Value, json};

use super::dialect::{reader, split_line};
use crate::error::AdminError;
use crate::helpers::format_timestamp;
use crate::repos::safe_delete::BATCH_ENTITY_ID;
use crate::service::{AdminService, require_admin};
use crate::store::{EntityStore, UnitOfWork};

/// Delimiters tried, in order, when no `sep=` hint says otherwise.
pub const DELIMITER_CANDIDATES: &[u8] = b";,\t|";

/// Accepted id header spellings, most specific first. Compared lower-cased and trimmed.
pub const ID_HEADERS: &[&str] = &["id", "azonosító", "azonosito", "registration id", "order id"];

/// Accepted payment-status header spellings, most specific first.
///
/// A plain `status` column only counts when no payment-status column exists,
/// since registration exports carry both.
pub const STATUS_HEADERS: &[&str] = &[
    "paymentstatus",
    "payment status",
    "payment_status",
    "fizetési státusz",
    "fizetesi statusz",
    "státusz",
    "status",
];

/// Which table an import updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget {
    Registrations,
    Orders,
}

impl ImportTarget {
    #[must_use]
    pub const fn table(self) -> Table {
        match self {
            Self::Registrations => Table::Registrations,
            Self::Orders => Table::Orders,
        }
    }

    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        self.table().entity_name()
    }
}

impl fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().as_str())
    }
}

impl FromStr for ImportTarget {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registrations" | "registration" => Ok(Self::Registrations),
            "orders" | "order" => Ok(Self::Orders),
            other => Err(AdminError::Validation(format!(
                "unknown import target '{other}' (expected registrations or orders)"
            ))),
        }
    }
}

/// Column positions found in a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub delimiter: u8,
    pub id_index: usize,
    pub status_index: usize,
}

impl HeaderLayout {
    /// Minimum number of fields a data row needs.
    #[must_use]
    pub fn width(&self) -> usize {
        self.id_index.max(self.status_index) + 1
    }
}

/// First position of the most specific synonym present in `headers`.
fn find_column(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    synonyms
        .iter()
        .find_map(|wanted| headers.iter().position(|h| h == wanted))
}

/// Printable name of a delimiter for reports.
#[must_use]
pub fn delimiter_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => char::from(other).to_string(),
    }
}

/// Work out the delimiter and the id/status columns from a header line.
///
/// `hint` (from a `sep=` line) is tried before the regular candidates.
///
/// # Errors
///
/// `AdminError::Validation` naming the missing columns when no candidate
/// yields both.
pub fn detect_layout(header: &str, hint: Option<u8>) -> Result<HeaderLayout, AdminError> {
    let mut candidates: Vec<u8> = hint
        .into_iter()
        .filter(|c| DELIMITER_CANDIDATES.contains(c))
        .collect();
    candidates.extend(DELIMITER_CANDIDATES.iter().filter(|c| Some(**c) != hint));

    // (found columns, id found, status found) of the closest miss
    let mut best = (0, false, false);
    for delimiter in candidates {
        let headers: Vec<String> = split_line(header, delimiter)
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let id_index = find_column(&headers, ID_HEADERS);
        let status_index = find_column(&headers, STATUS_HEADERS);
        if let (Some(id_index), Some(status_index)) = (id_index, status_index) {
            return Ok(HeaderLayout {
                delimiter,
                id_index,
                status_index,
            });
        }
        let found = usize::from(id_index.is_some()) + usize::from(status_index.is_some());
        if found > best.0 {
            best = (found, id_index.is_some(), status_index.is_some());
        }
    }

    let mut missing = Vec::new();
    if !best.1 {
        missing.push(format!("id (one of: {})", ID_HEADERS.join(", ")));
    }
    if !best.2 {
        missing.push(format!("payment status (one of: {})", STATUS_HEADERS.join(", ")));
    }
    Err(AdminError::Validation(format!(
        "CSV header is missing required columns: {}",
        missing.join("; ")
    )))
}

/// Text after the BOM and a leading `sep=X` line.
struct Body<'a> {
    text: &'a str,
    /// Delimiter named by the `sep=` line, if it is a single byte.
    hint: Option<u8>,
    /// Lines removed ahead of `text`, for reporting file line numbers.
    skipped_lines: u64,
}

fn strip_preamble(text: &str) -> Body<'_> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let first = first.trim_end_matches('\r');
    let is_sep_line = first
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("sep="));
    if !is_sep_line {
        return Body {
            text,
            hint: None,
            skipped_lines: 0,
        };
    }
    let hint = first[4..].chars().next().and_then(|c| u8::try_from(c).ok());
    Body {
        text: rest,
        hint,
        skipped_lines: 1,
    }
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

impl<S: EntityStore> AdminService<S> {
    /// Import payment statuses from CSV text.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins and `Validation` when the file is empty
    /// or its header lacks the id or status column. Row-level problems never
    /// fail the import; they are counted in the report.
    pub async fn import_payments(
        &self,
        actor: &Actor,
        target: ImportTarget,
        text: &str,
    ) -> Result<ImportReport, AdminError> {
        require_admin(actor, "csv import")?;

        let body = strip_preamble(text);
        let Some(header) = body.text.lines().find(|l| !l.trim().is_empty()) else {
            return Err(AdminError::Validation("CSV file has no header line".into()));
        };
        let layout = detect_layout(header, body.hint)?;
        tracing::debug!(delimiter = %delimiter_name(layout.delimiter), ?layout, "CSV header parsed");

        let table = target.table();
        let mut report = ImportReport {
            delimiter: delimiter_name(layout.delimiter),
            ..ImportReport::default()
        };

        let mut header_seen = false;
        for row in reader(body.text, layout.delimiter).into_records() {
            let fields = match row {
                Ok(fields) => fields,
                Err(error) => {
                    let line_no = error.position().map_or(0, csv::Position::line) + body.skipped_lines;
                    report.skipped_rows += 1;
                    report.errors.push(format!("line {line_no}: unreadable row: {error}"));
                    continue;
                }
            };
            if is_blank(&fields) {
                continue;
            }
            if !header_seen {
                header_seen = true;
                continue;
            }
            let line_no = fields.position().map_or(0, csv::Position::line) + body.skipped_lines;

            if fields.len() < layout.width() {
                report.skipped_rows += 1;
                report.errors.push(format!(
                    "line {line_no}: expected at least {} columns, found {}",
                    layout.width(),
                    fields.len()
                ));
                continue;
            }

            let id = fields[layout.id_index].trim();
            if id.is_empty() {
                report.skipped_rows += 1;
                report.errors.push(format!("line {line_no}: empty id"));
                continue;
            }

            let raw_status = fields[layout.status_index].trim();
            let Some(status) = PaymentStatus::from_synonym(raw_status) else {
                report.unknown_status += 1;
                report
                    .errors
                    .push(format!("line {line_no}: unknown payment status '{raw_status}' for {id}"));
                continue;
            };

            let mut changes = Record::new();
            changes.insert("paymentStatus".into(), Value::String(status.as_str().into()));
            changes.insert("updatedAt".into(), Value::String(format_timestamp(Utc::now())));

            match self.store().update(table, id, changes).await {
                Ok(true) => {
                    tracing::debug!(%table, id, %status, "payment status updated");
                    report.updated += 1;
                }
                Ok(false) => {
                    report.db_errors += 1;
                    report
                        .errors
                        .push(format!("line {line_no}: {} {id} not found", target.entity_name()));
                }
                Err(error) => {
                    tracing::warn!(%table, id, %error, "payment status update failed");
                    report.db_errors += 1;
                    report.errors.push(format!("line {line_no}: update of {id} failed: {error}"));
                }
            }
        }

        if report.updated > 0 {
            let summary = json!({
                "source": "csv",
                "updated": report.updated,
                "dbErrors": report.db_errors,
                "skipped": report.skipped_rows + report.unknown_status,
            });
            let outcome = self
                .log_action(
                    Some(actor),
                    AuditAction::Update,
                    target.entity_name(),
                    BATCH_ENTITY_ID,
                    Some(&summary),
                )
                .await;
            report.errors.extend(outcome.warning());
        }

        tracing::info!(
            actor = %actor.id,
            %target,
            updated = report.updated,
            db_errors = report.db_errors,
            skipped = report.skipped_rows + report.unknown_status,
            "payment import finished"
        );
        Ok(report)
    }
}

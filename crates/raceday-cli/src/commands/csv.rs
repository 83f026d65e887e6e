use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use raceday_core::responses::ActionResult;
use raceday_db::csv::ImportTarget;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CsvCommands;
use crate::context::AppContext;
use crate::output::report;

/// Handle `raceday csv`.
pub async fn handle(action: &CsvCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        CsvCommands::Import { file, target } => import(Path::new(file), *target, ctx, flags).await,
        CsvCommands::Export { slug, out } => export(slug, out.as_deref(), ctx, flags).await,
    }
}

async fn import(
    file: &Path,
    target: ImportTarget,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let result = ctx.service.import_payments(&ctx.actor, target, &text).await;
    let warnings = result
        .as_ref()
        .map(|report| report.errors.clone())
        .unwrap_or_default();
    let action = ActionResult::from_result("csv import", result).with_warnings(warnings);
    report(&action, flags.format)
}

/// Where an export landed.
#[derive(Debug, Serialize)]
struct CsvWritten {
    path: String,
    filename: String,
    rows: usize,
}

impl fmt::Display for CsvWritten {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wrote {} registrations to {}", self.rows, self.path)
    }
}

async fn export(slug: &str, out: Option<&str>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let result = write_export(slug, out, ctx).await;
    report(&ActionResult::from_result("csv export", result), flags.format)
}

async fn write_export(slug: &str, out: Option<&str>, ctx: &AppContext) -> anyhow::Result<CsvWritten> {
    let today = Local::now().date_naive();
    let export = ctx.service.export_registrations(&ctx.actor, slug, today).await?;

    let path = out.map_or_else(|| PathBuf::from(&export.filename), PathBuf::from);
    tokio::fs::write(&path, export.body.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(CsvWritten {
        path: path.display().to_string(),
        filename: export.filename,
        rows: export.rows,
    })
}

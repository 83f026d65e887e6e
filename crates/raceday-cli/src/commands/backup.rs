use std::path::{Path, PathBuf};

use chrono::Utc;
use raceday_core::responses::{ActionResult, RestorePolicy};
use raceday_db::backup::ExportOptions;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::BackupCommands;
use crate::context::AppContext;
use crate::output::{output, report};

/// Handle `raceday backup`.
pub async fn handle(
    action: &BackupCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        BackupCommands::Export { out, embed } => export(out.as_deref(), *embed, ctx, flags).await,
        BackupCommands::Restore { file, mode, yes } => {
            restore(Path::new(file), (*mode).into(), *yes, ctx, flags).await
        }
        BackupCommands::Auto => {
            let result = ctx
                .service
                .check_and_create_auto_backup(&ctx.actor, Utc::now())
                .await;
            report(&ActionResult::from_result("auto-backup", result), flags.format)
        }
        BackupCommands::List => {
            let names = ctx.service.list_auto_backups().await?;
            output(&names, flags.format)
        }
    }
}

fn default_export_path() -> PathBuf {
    PathBuf::from(format!("backup-{}.json", Utc::now().format("%Y%m%d-%H%M%S")))
}

async fn export(
    out: Option<&str>,
    embed: bool,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let path = out.map_or_else(default_export_path, PathBuf::from);
    let options = if embed {
        ExportOptions::embedded()
    } else {
        ExportOptions::default()
    };
    let result = ctx.service.export_to_file(&ctx.actor, &path, &options).await;
    report(&ActionResult::from_result("backup export", result), flags.format)
}

async fn restore(
    file: &Path,
    policy: RestorePolicy,
    confirmed: bool,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    if policy == RestorePolicy::Replace && !confirmed {
        anyhow::bail!(
            "a replacing restore deletes every table before loading {}; pass --yes to confirm",
            file.display()
        );
    }

    let result = ctx.service.restore_from_file(&ctx.actor, file, policy).await;
    let warnings = result
        .as_ref()
        .map(|report| report.warnings.clone())
        .unwrap_or_default();
    let action = ActionResult::from_result("backup restore", result).with_warnings(warnings);
    report(&action, flags.format)
}

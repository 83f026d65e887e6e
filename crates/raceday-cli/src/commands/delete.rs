use raceday_core::record::Filter;
use raceday_core::responses::ActionResult;
use raceday_db::repos::DeleteOptions;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{DeleteArgs, DeleteManyArgs, RecordArgs};
use crate::context::AppContext;
use crate::output::report;

/// Handle `raceday delete`.
pub async fn handle_delete(
    args: &DeleteArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let options = DeleteOptions {
        skip_audit_log: args.skip_audit,
        skip_snapshot: args.skip_snapshot,
        force_delete: args.force,
        log_each_item: false,
    };
    let result = ctx
        .service
        .safe_delete(&ctx.actor, args.table, &args.id, options)
        .await;
    let warnings = result
        .as_ref()
        .map(|deleted| deleted.warnings.clone())
        .unwrap_or_default();
    report(
        &ActionResult::from_result("delete", result).with_warnings(warnings),
        flags.format,
    )
}

/// Handle `raceday delete-many`.
pub async fn handle_delete_many(
    args: &DeleteManyArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let filter = conditions_filter(&args.conditions);
    let options = DeleteOptions {
        skip_audit_log: args.skip_audit,
        skip_snapshot: false,
        force_delete: args.force,
        log_each_item: args.each,
    };
    let result = ctx
        .service
        .safe_delete_many(&ctx.actor, args.table, &filter, options)
        .await;
    let warnings = result
        .as_ref()
        .map(|bulk| bulk.warnings.clone())
        .unwrap_or_default();
    report(
        &ActionResult::from_result("bulk delete", result).with_warnings(warnings),
        flags.format,
    )
}

/// Handle `raceday soft-delete`.
pub async fn handle_soft_delete(
    args: &RecordArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let result = ctx.service.soft_delete(&ctx.actor, args.table, &args.id).await;
    let warnings = result
        .as_ref()
        .map(|change| change.warnings.clone())
        .unwrap_or_default();
    report(
        &ActionResult::from_result("soft delete", result).with_warnings(warnings),
        flags.format,
    )
}

/// Handle `raceday restore-deleted`.
pub async fn handle_restore_deleted(
    args: &RecordArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let result = ctx
        .service
        .restore_soft_delete(&ctx.actor, args.table, &args.id)
        .await;
    let warnings = result
        .as_ref()
        .map(|change| change.warnings.clone())
        .unwrap_or_default();
    report(
        &ActionResult::from_result("restore deleted", result).with_warnings(warnings),
        flags.format,
    )
}

fn conditions_filter(conditions: &[(String, String)]) -> Filter {
    conditions
        .iter()
        .fold(Filter::all(), |filter, (column, value)| {
            filter.equals(column, value.as_str())
        })
}

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuditCommands;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Handle `raceday audit`.
pub async fn handle(
    action: &AuditCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let entries = match action {
        AuditCommands::Recent { limit } => {
            ctx.service
                .recent_logs(effective_limit(*limit, flags.limit))
                .await
        }
        AuditCommands::Entity {
            entity_type,
            entity_id,
            limit,
        } => {
            ctx.service
                .logs_for_entity(entity_type, entity_id, effective_limit(*limit, flags.limit))
                .await
        }
        AuditCommands::User { user_id, limit } => {
            ctx.service
                .logs_by_user(user_id, effective_limit(*limit, flags.limit))
                .await
        }
    };
    output(&entries, flags.format)
}

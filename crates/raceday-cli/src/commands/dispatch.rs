use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Backup { action } => commands::backup::handle(&action, ctx, flags).await,
        Commands::Audit { action } => commands::audit::handle(&action, ctx, flags).await,
        Commands::Delete(args) => commands::delete::handle_delete(&args, ctx, flags).await,
        Commands::DeleteMany(args) => commands::delete::handle_delete_many(&args, ctx, flags).await,
        Commands::SoftDelete(args) => commands::delete::handle_soft_delete(&args, ctx, flags).await,
        Commands::RestoreDeleted(args) => {
            commands::delete::handle_restore_deleted(&args, ctx, flags).await
        }
        Commands::Csv { action } => commands::csv::handle(&action, ctx, flags).await,
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}

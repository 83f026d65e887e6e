use clap::Subcommand;

/// Audit log queries. Entries come back newest first.
#[derive(Clone, Debug, Subcommand)]
pub enum AuditCommands {
    /// Latest entries across all entities.
    Recent {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Entries about one entity.
    Entity {
        /// Entity type as logged, e.g. `Registration`.
        entity_type: String,
        entity_id: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Entries recorded by one user.
    User {
        user_id: String,
        #[arg(long)]
        limit: Option<u32>,
    },
}

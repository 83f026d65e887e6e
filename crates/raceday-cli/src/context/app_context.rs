use anyhow::Context;
use raceday_config::RacedayConfig;
use raceday_core::identity::Actor;
use raceday_db::{AdminService, SqlStore};

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: AdminService<SqlStore>,
    /// Identity every gated operation runs as, from `operator.*` config.
    pub actor: Actor,
}

impl AppContext {
    /// Open the configured database and resolve the operator identity.
    pub async fn init(config: RacedayConfig) -> anyhow::Result<Self> {
        let actor = config.operator.actor();
        let path = config.database.path.clone();

        let service = AdminService::open(config)
            .await
            .with_context(|| format!("failed to open database at {path}"))?;

        tracing::debug!(database = %path, actor = %actor.id, role = %actor.role, "context ready");
        Ok(Self { service, actor })
    }
}

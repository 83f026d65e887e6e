use raceday_config::RacedayConfig;

/// Load `.env`, the TOML layers, and `RACEDAY_*` overrides.
pub fn load_config() -> anyhow::Result<RacedayConfig> {
    let config = RacedayConfig::load_with_dotenv()?;
    tracing::debug!(
        database = %config.database.path,
        backup_dir = %config.backup.dir,
        operator = %config.operator.id,
        "configuration loaded"
    );
    Ok(config)
}

use figment::Jail;
use raceday_config::{PROJECT_CONFIG_FILE, RacedayConfig};
use raceday_core::enums::Role;

#[test]
fn env_overrides_nested_values() {
    Jail::expect_with(|jail| {
        jail.set_env("RACEDAY_BACKUP__RETENTION", "7");
        jail.set_env("RACEDAY_DATABASE__PATH", ":memory:");
        jail.set_env("RACEDAY_OPERATOR__ROLE", "USER");

        let config = RacedayConfig::load().expect("config loads");
        assert_eq!(config.backup.retention, 7);
        assert!(config.database.is_in_memory());
        assert_eq!(config.operator.role, Role::User);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file(PROJECT_CONFIG_FILE, "[backup]\ndir = \"from-file\"\n")?;
        jail.set_env("RACEDAY_BACKUP__DIR", "from-env");

        let config = RacedayConfig::load().expect("config loads");
        assert_eq!(config.backup.dir, "from-env");
        Ok(())
    });
}

#[test]
fn env_value_is_validated() {
    Jail::expect_with(|jail| {
        jail.set_env("RACEDAY_BACKUP__MERGE_TIMEOUT_SECS", "0");
        assert!(RacedayConfig::load().is_err());
        Ok(())
    });
}

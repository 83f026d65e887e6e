use raceday_config::RacedayConfig;

/// Config sections that can be set from `RACEDAY_<SECTION>__<KEY>`.
const SECTIONS: &[(&str, &str)] = &[
    ("DATABASE", "PATH"),
    ("BACKUP", "DIR"),
    ("AUDIT", "MAX_ROWS"),
    ("OPERATOR", "ROLE"),
];

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &RacedayConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &RacedayConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();
    for (section, example) in SECTIONS {
        let single = format!("RACEDAY_{section}_");
        let double = format!("RACEDAY_{section}__");
        let mistyped = env_keys
            .iter()
            .any(|key| key.starts_with(&single) && !key.starts_with(&double));
        if mistyped {
            warnings.push(format!(
                "{} config ignores RACEDAY_{section}_* env vars. Use double underscores (example: RACEDAY_{section}__{example}).",
                section.to_lowercase()
            ));
        }
    }

    if config.database.is_in_memory() {
        warnings.push(
            "database.path is :memory:; changes are discarded when the command exits.".to_string(),
        );
    }

    warnings
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use raceday_config::RacedayConfig;

    use super::collect_unconfigured_warnings;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn warns_for_single_underscore_keys() {
        let warnings = collect_unconfigured_warnings(
            &RacedayConfig::default(),
            env(&[
                ("RACEDAY_BACKUP_DIR", "/srv/backups"),
                ("RACEDAY_OPERATOR_ROLE", "STAFF"),
                ("RACEDAY_LOG", "debug"),
            ]),
        );

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("RACEDAY_BACKUP__DIR"));
        assert!(warnings[1].contains("RACEDAY_OPERATOR__ROLE"));
    }

    #[test]
    fn does_not_warn_for_well_formed_keys() {
        let warnings = collect_unconfigured_warnings(
            &RacedayConfig::default(),
            env(&[
                ("RACEDAY_BACKUP__DIR", "/srv/backups"),
                ("RACEDAY_AUDIT__MAX_ROWS", "200"),
                ("RACEDAY_LOG", "info"),
            ]),
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn warns_for_in_memory_database() {
        let mut config = RacedayConfig::default();
        config.database.path = ":memory:".into();
        let warnings = collect_unconfigured_warnings(&config, Vec::new());
        assert_eq!(warnings.len(), 1);
    }
}

//! # raceday-config
//!
//! Layered configuration loading for the raceday back-office using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`RACEDAY_*` prefix, `__` as separator)
//! 2. Project-level `./raceday.toml`
//! 3. User-level `~/.config/raceday/config.toml`
//! 4. Built-in defaults
//!
//! `RACEDAY_BACKUP__RETENTION=7` maps to `backup.retention`,
//! `RACEDAY_OPERATOR__ROLE=STAFF` to `operator.role`, and so on.
//!
//! ```no_run
//! use raceday_config::RacedayConfig;
//!
//! let config = RacedayConfig::load_with_dotenv().expect("config");
//! println!("backups go to {}", config.backup.dir);
//! ```

mod audit;
mod backup;
mod database;
mod error;
mod operator;

pub use audit::AuditConfig;
pub use backup::BackupConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use operator::OperatorConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local config file, relative to the working directory.
pub const PROJECT_CONFIG_FILE: &str = "raceday.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RacedayConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub operator: OperatorConfig,
}

impl RacedayConfig {
    /// Load configuration from TOML files and environment variables, then validate.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source cannot be parsed and
    /// `ConfigError::InvalidValue` when a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load `.env` from the working directory (if any), then [`Self::load`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary provider chain.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("RACEDAY_").split("__"))
    }

    /// Reject values the services cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::invalid("database.path", "must not be empty"));
        }
        if self.backup.retention == 0 {
            return Err(ConfigError::invalid("backup.retention", "must keep at least one file"));
        }
        if self.backup.replace_timeout_secs == 0 {
            return Err(ConfigError::invalid("backup.replace_timeout_secs", "must be at least 1"));
        }
        if self.backup.merge_timeout_secs == 0 {
            return Err(ConfigError::invalid("backup.merge_timeout_secs", "must be at least 1"));
        }
        if self.audit.max_rows == 0 {
            return Err(ConfigError::invalid("audit.max_rows", "must be at least 1"));
        }
        if self.audit.default_limit > self.audit.max_rows {
            return Err(ConfigError::invalid(
                "audit.default_limit",
                format!("must not exceed audit.max_rows ({})", self.audit.max_rows),
            ));
        }
        if self.operator.id.trim().is_empty() {
            return Err(ConfigError::invalid("operator.id", "must not be empty"));
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("raceday").join("config.toml"))
    }
}

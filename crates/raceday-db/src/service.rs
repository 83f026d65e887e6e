//! Service layer hosting every admin operation.
//!
//! `AdminService` owns an entity store and the loaded configuration. The
//! operations themselves live next to their concern as `impl AdminService`
//! blocks: [`crate::repos`], [`crate::backup`], and [`crate::csv`].
//!
//! Every privilege-gated operation takes the acting [`Actor`] explicitly and
//! checks its role before touching the store.

use raceday_config::RacedayConfig;
use raceday_core::identity::Actor;

use crate::error::{AdminError, StoreError};
use crate::store::{EntityStore, SqlStore};

pub struct AdminService<S> {
    store: S,
    config: RacedayConfig,
}

impl<S: EntityStore> AdminService<S> {
    #[must_use]
    pub const fn new(store: S, config: RacedayConfig) -> Self {
        Self { store, config }
    }

    /// Access the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &RacedayConfig {
        &self.config
    }
}

impl AdminService<SqlStore> {
    /// Open the libSQL database named by `config.database.path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or migrated.
    pub async fn open(config: RacedayConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config
            .database
            .file_path()
            .as_deref()
            .and_then(std::path::Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Migration(format!("create {}: {e}", parent.display())))?;
        }
        let store = SqlStore::open_local(&config.database.path).await?;
        Ok(Self::new(store, config))
    }
}

/// Reject actors that are not admins.
pub(crate) fn require_admin(actor: &Actor, operation: &str) -> Result<(), AdminError> {
    if actor.is_admin() {
        Ok(())
    } else {
        tracing::warn!(actor = %actor.id, role = %actor.role, operation, "rejected: admin role required");
        Err(AdminError::unauthorized(operation, "admin"))
    }
}

/// Reject actors that are neither staff nor admin.
pub(crate) fn require_staff(actor: &Actor, operation: &str) -> Result<(), AdminError> {
    if actor.is_staff_or_admin() {
        Ok(())
    } else {
        tracing::warn!(actor = %actor.id, role = %actor.role, operation, "rejected: staff role required");
        Err(AdminError::unauthorized(operation, "staff or admin"))
    }
}

//! Identity the CLI acts as.

use raceday_core::enums::Role;
use raceday_core::identity::Actor;
use serde::{Deserialize, Serialize};

fn default_id() -> String {
    "cli".to_string()
}

fn default_name() -> String {
    "CLI operator".to_string()
}

const fn default_role() -> Role {
    Role::Admin
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperatorConfig {
    #[serde(default = "default_id")]
    pub id: String,

    #[serde(default = "default_name")]
    pub name: String,

    /// `USER`, `STAFF`, or `ADMIN`.
    #[serde(default = "default_role")]
    pub role: Role,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            name: default_name(),
            role: default_role(),
        }
    }
}

impl OperatorConfig {
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::new(&self.id, &self.name, self.role)
    }
}

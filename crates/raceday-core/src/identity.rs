use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// Identifier recorded for operations that have no signed-in actor.
pub const SYSTEM_ACTOR_ID: &str = "SYSTEM";

/// The user on whose behalf an operation runs.
///
/// Passed explicitly into every privilege-gated or audit-logged operation.
/// Contains only data fields; session resolution happens in the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    /// The sentinel actor used when no session exists.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SYSTEM_ACTOR_ID, "System", Role::Admin)
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Whether the actor is admin or staff.
    #[must_use]
    pub const fn is_staff_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Staff)
    }
}

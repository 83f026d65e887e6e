//! Audit actions, payment statuses, and roles.
//!
//! Storage strings follow the upper-case enum convention of the relational
//! schema (`"PAID"`, `"SOFT_DELETE"`, `"ADMIN"`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Kind of operation recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    SoftDelete,
    ForceDelete,
    Restore,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::SoftDelete => "SOFT_DELETE",
            Self::ForceDelete => "FORCE_DELETE",
            Self::Restore => "RESTORE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "SOFT_DELETE" => Ok(Self::SoftDelete),
            "FORCE_DELETE" => Ok(Self::ForceDelete),
            "RESTORE" => Ok(Self::Restore),
            other => Err(CoreError::Validation(format!("unknown audit action '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// PaymentStatus
// ---------------------------------------------------------------------------

/// Payment state of a registration or shop order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
    Cancelled,
}

/// Free-text spellings accepted for each status, compared after upper-casing.
///
/// Covers the English enum names and the Hungarian labels used in
/// spreadsheet exports.
const STATUS_SYNONYMS: &[(&str, PaymentStatus)] = &[
    ("PAID", PaymentStatus::Paid),
    ("FIZETVE", PaymentStatus::Paid),
    ("FIZETETT", PaymentStatus::Paid),
    ("KIFIZETVE", PaymentStatus::Paid),
    ("PENDING", PaymentStatus::Pending),
    ("FÜGGŐBEN", PaymentStatus::Pending),
    ("FUGGOBEN", PaymentStatus::Pending),
    ("VÁRAKOZIK", PaymentStatus::Pending),
    ("FAILED", PaymentStatus::Failed),
    ("SIKERTELEN", PaymentStatus::Failed),
    ("REFUNDED", PaymentStatus::Refunded),
    ("VISSZATÉRÍTVE", PaymentStatus::Refunded),
    ("CANCELLED", PaymentStatus::Cancelled),
    ("CANCELED", PaymentStatus::Cancelled),
    ("TÖRÖLVE", PaymentStatus::Cancelled),
    ("LEMONDVA", PaymentStatus::Cancelled),
];

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Normalize free-form status text through the synonym table.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for text that is not a known spelling.
    #[must_use]
    pub fn from_synonym(text: &str) -> Option<Self> {
        let wanted = text.trim().to_uppercase();
        if wanted.is_empty() {
            return None;
        }
        STATUS_SYNONYMS
            .iter()
            .find(|(spelling, _)| *spelling == wanted)
            .map(|(_, status)| *status)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Privilege level of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Staff,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Staff => "STAFF",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "STAFF" => Ok(Self::Staff),
            "ADMIN" => Ok(Self::Admin),
            other => Err(CoreError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

//! Managed tables and their persisted-column allow-lists.
//!
//! Every table the back-office reads or writes is described here once: the
//! columns that are persisted (and therefore exported), their storage kind,
//! the foreign keys they declare, and whether rows are soft-deletable.
//! Export, restore, CSV import, and both store implementations work from
//! these descriptions instead of stripping relation keys ad hoc.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;
use crate::record::Record;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A managed table. Serialized as its camelCase document key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    Sellers,
    MembershipTiers,
    Products,
    Partners,
    Sponsors,
    StaticContents,
    GlobalSettings,
    Users,
    Accounts,
    Sessions,
    Events,
    Distances,
    PriceTiers,
    Registrations,
    Notifications,
    Feedback,
    Orders,
    OrderItems,
    AuditLogs,
    VerificationTokens,
}

impl Table {
    /// Parent-before-child order used for inserts and upserts.
    pub const RESTORE_ORDER: &'static [Self] = &[
        Self::Sellers,
        Self::MembershipTiers,
        Self::Products,
        Self::Partners,
        Self::Sponsors,
        Self::StaticContents,
        Self::GlobalSettings,
        Self::Users,
        Self::Accounts,
        Self::Sessions,
        Self::Events,
        Self::Distances,
        Self::PriceTiers,
        Self::Registrations,
        Self::Notifications,
        Self::Feedback,
        Self::Orders,
        Self::OrderItems,
    ];

    /// Child-before-parent order used when wiping tables.
    pub const DELETE_ORDER: &'static [Self] = &[
        Self::OrderItems,
        Self::Orders,
        Self::Registrations,
        Self::Notifications,
        Self::Feedback,
        Self::Sessions,
        Self::Accounts,
        Self::PriceTiers,
        Self::Distances,
        Self::Events,
        Self::Users,
        Self::GlobalSettings,
        Self::StaticContents,
        Self::Sponsors,
        Self::Partners,
        Self::Products,
        Self::MembershipTiers,
        Self::Sellers,
    ];

    /// Every table, including the ones that are never backed up.
    pub const ALL: &'static [Self] = &[
        Self::Sellers,
        Self::MembershipTiers,
        Self::Products,
        Self::Partners,
        Self::Sponsors,
        Self::StaticContents,
        Self::GlobalSettings,
        Self::Users,
        Self::Accounts,
        Self::Sessions,
        Self::Events,
        Self::Distances,
        Self::PriceTiers,
        Self::Registrations,
        Self::Notifications,
        Self::Feedback,
        Self::Orders,
        Self::OrderItems,
        Self::AuditLogs,
        Self::VerificationTokens,
    ];

    /// Document key and SQL table name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sellers => "sellers",
            Self::MembershipTiers => "membershipTiers",
            Self::Products => "products",
            Self::Partners => "partners",
            Self::Sponsors => "sponsors",
            Self::StaticContents => "staticContents",
            Self::GlobalSettings => "globalSettings",
            Self::Users => "users",
            Self::Accounts => "accounts",
            Self::Sessions => "sessions",
            Self::Events => "events",
            Self::Distances => "distances",
            Self::PriceTiers => "priceTiers",
            Self::Registrations => "registrations",
            Self::Notifications => "notifications",
            Self::Feedback => "feedback",
            Self::Orders => "orders",
            Self::OrderItems => "orderItems",
            Self::AuditLogs => "auditLogs",
            Self::VerificationTokens => "verificationTokens",
        }
    }

    /// Singular entity name recorded in audit entries.
    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        match self {
            Self::Sellers => "Seller",
            Self::MembershipTiers => "MembershipTier",
            Self::Products => "Product",
            Self::Partners => "Partner",
            Self::Sponsors => "Sponsor",
            Self::StaticContents => "StaticContent",
            Self::GlobalSettings => "GlobalSetting",
            Self::Users => "User",
            Self::Accounts => "Account",
            Self::Sessions => "Session",
            Self::Events => "Event",
            Self::Distances => "Distance",
            Self::PriceTiers => "PriceTier",
            Self::Registrations => "Registration",
            Self::Notifications => "Notification",
            Self::Feedback => "Feedback",
            Self::Orders => "Order",
            Self::OrderItems => "OrderItem",
            Self::AuditLogs => "AuditLog",
            Self::VerificationTokens => "VerificationToken",
        }
    }

    /// Whether the table belongs to backups at all.
    #[must_use]
    pub const fn is_backed_up(self) -> bool {
        !matches!(self, Self::AuditLogs | Self::VerificationTokens)
    }

    #[must_use]
    pub fn schema(self) -> &'static TableSchema {
        match self {
            Self::Sellers => &SELLERS,
            Self::MembershipTiers => &MEMBERSHIP_TIERS,
            Self::Products => &PRODUCTS,
            Self::Partners => &PARTNERS,
            Self::Sponsors => &SPONSORS,
            Self::StaticContents => &STATIC_CONTENTS,
            Self::GlobalSettings => &GLOBAL_SETTINGS,
            Self::Users => &USERS,
            Self::Accounts => &ACCOUNTS,
            Self::Sessions => &SESSIONS,
            Self::Events => &EVENTS,
            Self::Distances => &DISTANCES,
            Self::PriceTiers => &PRICE_TIERS,
            Self::Registrations => &REGISTRATIONS,
            Self::Notifications => &NOTIFICATIONS,
            Self::Feedback => &FEEDBACK,
            Self::Orders => &ORDERS,
            Self::OrderItems => &ORDER_ITEMS,
            Self::AuditLogs => &AUDIT_LOGS,
            Self::VerificationTokens => &VERIFICATION_TOKENS,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = CoreError;

    /// Accepts the document key (`priceTiers`) or the entity name (`PriceTier`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| {
                t.as_str().eq_ignore_ascii_case(wanted) || t.entity_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CoreError::UnknownTable(wanted.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Column descriptions
// ---------------------------------------------------------------------------

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Bool,
    /// Arbitrary JSON, stored as serialized text.
    Json,
    /// RFC 3339 timestamp string.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

const fn req(name: &'static str, kind: ColumnKind) -> Column {
    Column {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: ColumnKind) -> Column {
    Column {
        name,
        kind,
        required: false,
    }
}

/// A foreign key declared by a child table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub parent: Table,
    /// Required references cannot be nulled out when the parent is missing.
    pub required: bool,
}

const fn fk(column: &'static str, parent: Table, required: bool) -> ForeignKey {
    ForeignKey {
        column,
        parent,
        required,
    }
}

/// Relation arrays that some export shapes nest under a parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embedding {
    pub parent: Table,
    pub child: Table,
    /// Key of the nested array on the parent record.
    pub key: &'static str,
    /// Column on the child that points back at the parent.
    pub foreign_key: &'static str,
}

/// Nested relations, outermost first.
pub const EMBEDDINGS: &[Embedding] = &[
    Embedding {
        parent: Table::Events,
        child: Table::Distances,
        key: "distances",
        foreign_key: "eventId",
    },
    Embedding {
        parent: Table::Distances,
        child: Table::PriceTiers,
        key: "priceTiers",
        foreign_key: "distanceId",
    },
    Embedding {
        parent: Table::Orders,
        child: Table::OrderItems,
        key: "items",
        foreign_key: "orderId",
    },
];

/// Name of the soft-delete marker column.
pub const DELETED_AT: &str = "deletedAt";

/// Persisted shape of one table.
#[derive(Debug)]
pub struct TableSchema {
    pub table: Table,
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
    pub soft_delete: bool,
}

impl TableSchema {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Keep only allow-listed columns, in declaration order.
    ///
    /// Relation arrays, back-references, and any other key that is not a
    /// persisted column are dropped.
    #[must_use]
    pub fn project(&self, record: &Record) -> Record {
        let mut out = Record::new();
        for column in self.columns {
            if let Some(value) = record.get(column.name) {
                out.insert(column.name.to_string(), value.clone());
            }
        }
        out
    }

    /// Required columns that are absent or null in `record`.
    #[must_use]
    pub fn missing_required(&self, record: &Record) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .filter(|c| record.get(c.name).is_none_or(serde_json::Value::is_null))
            .map(|c| c.name)
            .collect()
    }

    /// Ensure a column belongs to this table.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownColumn` when it does not.
    pub fn check_column(&self, name: &str) -> Result<&Column, CoreError> {
        self.column(name).ok_or_else(|| CoreError::UnknownColumn {
            table: self.table.as_str().to_string(),
            column: name.to_string(),
        })
    }
}

use ColumnKind::{Bool, Integer, Json, Real, Text, Timestamp};

static SELLERS: TableSchema = TableSchema {
    table: Table::Sellers,
    columns: &[
        req("id", Text),
        req("name", Text),
        opt("taxNumber", Text),
        opt("address", Text),
        opt("email", Text),
        opt("phone", Text),
        opt("bankAccount", Text),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

static MEMBERSHIP_TIERS: TableSchema = TableSchema {
    table: Table::MembershipTiers,
    columns: &[
        req("id", Text),
        req("name", Text),
        opt("description", Text),
        opt("price", Integer),
        opt("discountPercent", Real),
        opt("durationDays", Integer),
        opt("active", Bool),
        opt("sortOrder", Integer),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

static PRODUCTS: TableSchema = TableSchema {
    table: Table::Products,
    columns: &[
        req("id", Text),
        opt("sellerId", Text),
        req("name", Text),
        req("slug", Text),
        opt("description", Text),
        req("price", Integer),
        opt("stock", Integer),
        opt("images", Json),
        opt("active", Bool),
        opt("deletedAt", Timestamp),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[fk("sellerId", Table::Sellers, false)],
    soft_delete: true,
};

static PARTNERS: TableSchema = TableSchema {
    table: Table::Partners,
    columns: &[
        req("id", Text),
        req("name", Text),
        opt("logoUrl", Text),
        opt("websiteUrl", Text),
        opt("sortOrder", Integer),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

static SPONSORS: TableSchema = TableSchema {
    table: Table::Sponsors,
    columns: &[
        req("id", Text),
        req("name", Text),
        opt("logoUrl", Text),
        opt("websiteUrl", Text),
        opt("tier", Text),
        opt("sortOrder", Integer),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

static STATIC_CONTENTS: TableSchema = TableSchema {
    table: Table::StaticContents,
    columns: &[
        req("id", Text),
        req("key", Text),
        req("locale", Text),
        opt("title", Text),
        opt("body", Text),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

static GLOBAL_SETTINGS: TableSchema = TableSchema {
    table: Table::GlobalSettings,
    columns: &[
        req("id", Text),
        req("key", Text),
        opt("value", Json),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

static USERS: TableSchema = TableSchema {
    table: Table::Users,
    columns: &[
        req("id", Text),
        opt("name", Text),
        req("email", Text),
        opt("emailVerified", Timestamp),
        opt("passwordHash", Text),
        req("role", Text),
        opt("image", Text),
        opt("phone", Text),
        opt("membershipTierId", Text),
        opt("membershipExpiresAt", Timestamp),
        opt("deletedAt", Timestamp),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[fk("membershipTierId", Table::MembershipTiers, false)],
    soft_delete: true,
};

static ACCOUNTS: TableSchema = TableSchema {
    table: Table::Accounts,
    columns: &[
        req("id", Text),
        req("userId", Text),
        req("type", Text),
        req("provider", Text),
        req("providerAccountId", Text),
        opt("refreshToken", Text),
        opt("accessToken", Text),
        opt("expiresAt", Integer),
        opt("tokenType", Text),
        opt("scope", Text),
        opt("idToken", Text),
    ],
    foreign_keys: &[fk("userId", Table::Users, true)],
    soft_delete: false,
};

static SESSIONS: TableSchema = TableSchema {
    table: Table::Sessions,
    columns: &[
        req("id", Text),
        req("sessionToken", Text),
        req("userId", Text),
        req("expires", Timestamp),
    ],
    foreign_keys: &[fk("userId", Table::Users, true)],
    soft_delete: false,
};

static EVENTS: TableSchema = TableSchema {
    table: Table::Events,
    columns: &[
        req("id", Text),
        req("organizerId", Text),
        opt("sellerId", Text),
        req("title", Text),
        req("slug", Text),
        opt("description", Text),
        opt("location", Text),
        req("startDate", Timestamp),
        opt("endDate", Timestamp),
        opt("registrationOpensAt", Timestamp),
        opt("registrationClosesAt", Timestamp),
        opt("coverImage", Text),
        opt("published", Bool),
        opt("formConfig", Json),
        opt("deletedAt", Timestamp),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[
        fk("organizerId", Table::Users, true),
        fk("sellerId", Table::Sellers, false),
    ],
    soft_delete: true,
};

static DISTANCES: TableSchema = TableSchema {
    table: Table::Distances,
    columns: &[
        req("id", Text),
        req("eventId", Text),
        req("name", Text),
        opt("lengthKm", Real),
        opt("capacity", Integer),
        opt("startTime", Timestamp),
        opt("sortOrder", Integer),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[fk("eventId", Table::Events, true)],
    soft_delete: false,
};

static PRICE_TIERS: TableSchema = TableSchema {
    table: Table::PriceTiers,
    columns: &[
        req("id", Text),
        req("distanceId", Text),
        req("name", Text),
        req("price", Integer),
        opt("validFrom", Timestamp),
        opt("validUntil", Timestamp),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[fk("distanceId", Table::Distances, true)],
    soft_delete: false,
};

static REGISTRATIONS: TableSchema = TableSchema {
    table: Table::Registrations,
    columns: &[
        req("id", Text),
        opt("userId", Text),
        req("eventId", Text),
        req("distanceId", Text),
        req("firstName", Text),
        req("lastName", Text),
        req("email", Text),
        opt("phone", Text),
        opt("birthDate", Text),
        opt("gender", Text),
        opt("country", Text),
        opt("zipCode", Text),
        opt("city", Text),
        opt("address", Text),
        opt("price", Integer),
        req("paymentStatus", Text),
        req("status", Text),
        opt("emergencyName", Text),
        opt("emergencyPhone", Text),
        opt("billingName", Text),
        opt("billingZipCode", Text),
        opt("billingCity", Text),
        opt("billingAddress", Text),
        opt("billingTaxNumber", Text),
        opt("formData", Json),
        opt("deletedAt", Timestamp),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[
        fk("userId", Table::Users, false),
        fk("eventId", Table::Events, true),
        fk("distanceId", Table::Distances, true),
    ],
    soft_delete: true,
};

static NOTIFICATIONS: TableSchema = TableSchema {
    table: Table::Notifications,
    columns: &[
        req("id", Text),
        req("userId", Text),
        req("title", Text),
        req("message", Text),
        opt("read", Bool),
        opt("createdAt", Timestamp),
    ],
    foreign_keys: &[fk("userId", Table::Users, true)],
    soft_delete: false,
};

static FEEDBACK: TableSchema = TableSchema {
    table: Table::Feedback,
    columns: &[
        req("id", Text),
        opt("userId", Text),
        opt("eventId", Text),
        opt("rating", Integer),
        opt("message", Text),
        opt("createdAt", Timestamp),
    ],
    foreign_keys: &[
        fk("userId", Table::Users, false),
        fk("eventId", Table::Events, false),
    ],
    soft_delete: false,
};

static ORDERS: TableSchema = TableSchema {
    table: Table::Orders,
    columns: &[
        req("id", Text),
        opt("userId", Text),
        req("email", Text),
        opt("name", Text),
        req("total", Integer),
        req("paymentStatus", Text),
        req("status", Text),
        opt("shippingAddress", Json),
        opt("billing", Json),
        opt("deletedAt", Timestamp),
        opt("createdAt", Timestamp),
        opt("updatedAt", Timestamp),
    ],
    foreign_keys: &[fk("userId", Table::Users, false)],
    soft_delete: true,
};

static ORDER_ITEMS: TableSchema = TableSchema {
    table: Table::OrderItems,
    columns: &[
        req("id", Text),
        req("orderId", Text),
        opt("productId", Text),
        opt("productName", Text),
        req("quantity", Integer),
        req("unitPrice", Integer),
    ],
    foreign_keys: &[
        fk("orderId", Table::Orders, true),
        fk("productId", Table::Products, false),
    ],
    soft_delete: false,
};

static AUDIT_LOGS: TableSchema = TableSchema {
    table: Table::AuditLogs,
    columns: &[
        req("id", Text),
        req("userId", Text),
        req("userName", Text),
        req("action", Text),
        req("entityType", Text),
        req("entityId", Text),
        opt("entityData", Json),
        req("createdAt", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

static VERIFICATION_TOKENS: TableSchema = TableSchema {
    table: Table::VerificationTokens,
    columns: &[
        req("id", Text),
        req("identifier", Text),
        req("token", Text),
        req("expires", Timestamp),
    ],
    foreign_keys: &[],
    soft_delete: false,
};

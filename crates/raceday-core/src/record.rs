//! Store-neutral row and predicate shapes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One table row keyed by camelCase column name.
pub type Record = serde_json::Map<String, Value>;

/// Read the `id` of a record, if it is a non-empty string.
#[must_use]
pub fn record_id(record: &Record) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// A single column predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
    IsNull { column: String },
    NotNull { column: String },
}

impl Condition {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. }
            | Self::In { column, .. }
            | Self::IsNull { column }
            | Self::NotNull { column } => column,
        }
    }

    /// Evaluate against an in-memory record. Absent columns read as null.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Self::Eq { value, .. } => !actual.is_null() && actual == value,
            Self::In { values, .. } => !actual.is_null() && values.contains(actual),
            Self::IsNull { .. } => actual.is_null(),
            Self::NotNull { .. } => !actual.is_null(),
        }
    }
}

/// Ordering applied to a filtered read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Conjunction of conditions, with optional ordering and row cap.
///
/// An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Filter {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn by_id(id: &str) -> Self {
        Self::all().equals("id", Value::String(id.to_string()))
    }

    #[must_use]
    pub fn equals(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn any_of(mut self, column: &str, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In {
            column: column.to_string(),
            values,
        });
        self
    }

    #[must_use]
    pub fn is_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull {
            column: column.to_string(),
        });
        self
    }

    #[must_use]
    pub fn not_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::NotNull {
            column: column.to_string(),
        });
        self
    }

    #[must_use]
    pub fn newest_first(mut self, column: &str) -> Self {
        self.order_by = Some(OrderBy {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    #[must_use]
    pub fn oldest_first(mut self, column: &str) -> Self {
        self.order_by = Some(OrderBy {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Every column the filter touches, for allow-list checks.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .map(Condition::column)
            .chain(self.order_by.iter().map(|o| o.column.as_str()))
    }
}

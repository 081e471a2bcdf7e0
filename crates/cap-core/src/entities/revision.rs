use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuthMethod, TrackedField};

/// One append-only ledger record: a single field change on a single entry.
///
/// `revision_number` starts at 1 per entry and has no gaps.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RevisionRecord {
    pub id: String,
    pub entry_id: String,
    pub revision_number: i64,
    pub field: TrackedField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_by: String,
    pub reason: Option<String>,
    pub auth_method: AuthMethod,
    pub created_at: DateTime<Utc>,
}

/// A proposed change to a tracked field, rendered as ledger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: TrackedField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(
        field: TrackedField,
        old_value: Option<impl ToString>,
        new_value: Option<impl ToString>,
    ) -> Self {
        Self {
            field,
            old_value: old_value.map(|v| v.to_string()),
            new_value: new_value.map(|v| v.to_string()),
        }
    }

    /// No-op changes never reach the ledger.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}

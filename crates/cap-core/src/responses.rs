//! Response types for bulk workflow operations.
//!
//! Bulk operations report partial success: every targeted entry ends up either
//! in the success side or in a per-item failure list with a readable reason.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An entry a bulk operation left untouched, and why.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SkippedEntry {
    pub id: String,
    pub reason: String,
}

impl SkippedEntry {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result of bulk confirmation over one date or a date range.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BulkConfirmResponse {
    pub confirmed: u32,
    pub by_date: BTreeMap<NaiveDate, u32>,
    pub failed: Vec<SkippedEntry>,
}

/// Result of reassigning a batch of entries to an enhancement project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BulkReassignResponse {
    pub reassigned: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    pub reassigned_count: u32,
    pub skipped_count: u32,
}

//! Operation inputs.
//!
//! These are the request bodies of the HTTP surface as well; validation that
//! needs no storage lives here so it runs before any guard or write.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cap_core::enums::{ConfirmationMethod, ProjectPhase};
use cap_core::errors::CoreError;
use cap_core::policy::{
    MAX_BULK_RANGE_DAYS, MAX_BULK_REASSIGN_IDS, MAX_DESCRIPTION_LEN, MAX_REASON_LEN, non_blank,
    validate_hours, validate_text,
};

/// Fields a developer confirms for one entry. Unset phase and description
/// keep the entry's current values.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ConfirmFields {
    pub hours: f64,
    #[serde(default)]
    pub phase: Option<ProjectPhase>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub adjustment_reason: Option<String>,
}

impl ConfirmFields {
    #[must_use]
    pub const fn hours(hours: f64) -> Self {
        Self {
            hours,
            phase: None,
            description: None,
            adjustment_reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.adjustment_reason = Some(reason.into());
        self
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` for out-of-range hours or oversized text.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_hours(self.hours)?;
        validate_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        validate_text(
            "adjustment_reason",
            self.adjustment_reason.as_deref(),
            MAX_REASON_LEN,
        )
    }

    /// The adjustment reason with surrounding whitespace removed, if any remains.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        non_blank(self.adjustment_reason.as_deref())
    }
}

/// Dates targeted by a bulk confirmation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum BulkConfirmTarget {
    /// Every date in `[start, end]`, both inclusive.
    Range { start: NaiveDate, end: NaiveDate },
    Date { date: NaiveDate },
}

impl BulkConfirmTarget {
    /// Inclusive `(start, end)` bounds.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a reversed range or one longer than
    /// `MAX_BULK_RANGE_DAYS`.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate), CoreError> {
        match *self {
            Self::Date { date } => Ok((date, date)),
            Self::Range { start, end } => {
                if start > end {
                    return Err(CoreError::Validation(format!(
                        "range start {start} is after end {end}"
                    )));
                }
                let days = (end - start).num_days() + 1;
                if days > MAX_BULK_RANGE_DAYS {
                    return Err(CoreError::Validation(format!(
                        "range covers {days} days, at most {MAX_BULK_RANGE_DAYS} allowed"
                    )));
                }
                Ok((start, end))
            }
        }
    }

    /// Confirmation method recorded on entries confirmed through this target.
    #[must_use]
    pub const fn method(&self) -> ConfirmationMethod {
        match self {
            Self::Date { .. } => ConfirmationMethod::Bulk,
            Self::Range { .. } => ConfirmationMethod::BulkRange,
        }
    }
}

/// Estimation pipeline output for one developer-day.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SuggestionInput {
    pub developer_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub date: NaiveDate,
    pub estimated_hours: f64,
    pub phase_suggested: ProjectPhase,
    #[serde(default)]
    pub description_suggested: Option<String>,
    #[serde(default)]
    pub source_session_ids: Vec<String>,
    #[serde(default)]
    pub source_commit_ids: Vec<String>,
    #[serde(default)]
    pub enhancement_suggested: bool,
}

impl SuggestionInput {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank developer, bad hours or oversized text.
    pub fn validate(&self) -> Result<(), CoreError> {
        if non_blank(Some(&self.developer_id)).is_none() {
            return Err(CoreError::Validation("developer_id is required".into()));
        }
        validate_hours(self.estimated_hours)?;
        validate_text(
            "description_suggested",
            self.description_suggested.as_deref(),
            MAX_DESCRIPTION_LEN,
        )
    }
}

/// Hand-logged time. `developer_id` defaults to the acting developer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ManualEntryInput {
    #[serde(default)]
    pub developer_id: Option<String>,
    pub project_id: String,
    pub date: NaiveDate,
    pub hours: f64,
    /// Defaults to the project's phase.
    #[serde(default)]
    pub phase: Option<ProjectPhase>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ManualEntryInput {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank project, bad hours or oversized text.
    pub fn validate(&self) -> Result<(), CoreError> {
        if non_blank(Some(&self.project_id)).is_none() {
            return Err(CoreError::Validation("project_id is required".into()));
        }
        validate_hours(self.hours)?;
        validate_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
    }
}

/// Check a bulk reassignment id list: non-empty, bounded, no blanks.
/// Returns the ids in request order with duplicates removed.
///
/// # Errors
///
/// Returns `CoreError::Validation` describing the first problem found.
pub fn validate_entry_ids(ids: &[String]) -> Result<Vec<String>, CoreError> {
    if ids.is_empty() {
        return Err(CoreError::Validation("entry_ids must not be empty".into()));
    }
    if ids.len() > MAX_BULK_REASSIGN_IDS {
        return Err(CoreError::Validation(format!(
            "at most {MAX_BULK_REASSIGN_IDS} entry_ids allowed, got {}",
            ids.len()
        )));
    }
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = non_blank(Some(id))
            .ok_or_else(|| CoreError::Validation("entry_ids must not contain blank ids".into()))?;
        if !unique.iter().any(|seen| seen == id) {
            unique.push(id.to_string());
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn target_deserializes_date_or_range() {
        let single: BulkConfirmTarget = serde_json::from_str(r#"{"date":"2026-01-05"}"#).unwrap();
        assert_eq!(single, BulkConfirmTarget::Date { date: date(5) });
        assert_eq!(single.method(), ConfirmationMethod::Bulk);

        let range: BulkConfirmTarget =
            serde_json::from_str(r#"{"start":"2026-01-05","end":"2026-01-09"}"#).unwrap();
        assert_eq!(range.bounds().unwrap(), (date(5), date(9)));
        assert_eq!(range.method(), ConfirmationMethod::BulkRange);
    }

    #[test]
    fn range_limits() {
        let reversed = BulkConfirmTarget::Range {
            start: date(9),
            end: date(5),
        };
        assert!(reversed.bounds().is_err());

        let start = date(1);
        let max = BulkConfirmTarget::Range {
            start,
            end: start + chrono::Days::new(91),
        };
        assert!(max.bounds().is_ok());
        let too_long = BulkConfirmTarget::Range {
            start,
            end: start + chrono::Days::new(92),
        };
        assert!(too_long.bounds().is_err());
    }

    #[rstest]
    #[case(vec![], false)]
    #[case(vec!["ent-1".to_string(), "  ".to_string()], false)]
    #[case(vec!["ent-1".to_string()], true)]
    fn entry_id_validation(#[case] ids: Vec<String>, #[case] ok: bool) {
        assert_eq!(validate_entry_ids(&ids).is_ok(), ok);
    }

    #[test]
    fn entry_ids_are_deduplicated_in_order() {
        let ids = vec!["ent-2".to_string(), "ent-1".to_string(), "ent-2".to_string()];
        assert_eq!(validate_entry_ids(&ids).unwrap(), vec!["ent-2", "ent-1"]);
    }

    #[test]
    fn too_many_ids_rejected() {
        let ids: Vec<String> = (0..=MAX_BULK_REASSIGN_IDS).map(|i| format!("ent-{i}")).collect();
        assert!(validate_entry_ids(&ids).is_err());
    }

    #[test]
    fn blank_reason_counts_as_missing() {
        let fields = ConfirmFields::hours(6.5).with_reason("   ");
        assert_eq!(fields.reason(), None);
        assert!(fields.validate().is_ok());
        assert!(ConfirmFields::hours(30.0).validate().is_err());
    }
}

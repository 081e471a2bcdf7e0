use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::PeriodStatus;
use crate::period::Period;

/// Lock state of one accounting period. A missing record means open.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PeriodLock {
    pub period: Period,
    pub status: PeriodStatus,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
}

impl PeriodLock {
    /// The implicit state of a period with no lock record.
    #[must_use]
    pub const fn open(period: Period) -> Self {
        Self {
            period,
            status: PeriodStatus::Open,
            locked_by: None,
            locked_at: None,
        }
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self.status, PeriodStatus::Locked)
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dentlab_cases::LabCalendar;
use dentlab_core::{DomainError, DomainResult};

/// Inclusive billing period in local calendar days. A missing bound is open.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePeriod {
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
}

impl InvoicePeriod {
    pub fn new(from_date: Option<NaiveDate>, to_date: Option<NaiveDate>) -> DomainResult<Self> {
        let period = Self { from_date, to_date };
        period.validate()?;
        Ok(period)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                return Err(DomainError::validation(
                    "fromDate must not be after toDate",
                ));
            }
        }
        Ok(())
    }

    /// `start_of_day(from) <= at <= end_of_day(to)` in the lab's time zone.
    pub fn contains(&self, at: DateTime<Utc>, calendar: &LabCalendar) -> bool {
        let after_from = self
            .from_date
            .is_none_or(|from| at >= calendar.start_of_day(from));
        let before_to = self
            .to_date
            .is_none_or(|to| at <= calendar.end_of_day(to));
        after_from && before_to
    }
}

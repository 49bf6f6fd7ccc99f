//! Case listing filters used by the doctor and owner views.

use std::collections::BTreeSet;

use crate::calendar::LabCalendar;
use crate::case::DentalCase;

/// Listing filter. Every set criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    /// Case-insensitive substring of the patient name.
    pub patient_query: Option<String>,
    /// Local month key, `yyyy-MM`.
    pub month: Option<String>,
    /// Doctor view: hide cases whose requested deletion was carried out.
    pub doctor_view: bool,
}

impl CaseFilter {
    pub fn doctor() -> Self {
        Self {
            doctor_view: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, case: &DentalCase, calendar: &LabCalendar) -> bool {
        if self.doctor_view && !case.is_visible_to_doctor() {
            return false;
        }

        if let Some(query) = self.patient_query.as_deref() {
            let query = query.trim().to_lowercase();
            if !query.is_empty() && !case.patient_name.to_lowercase().contains(&query) {
                return false;
            }
        }

        match self.month.as_deref() {
            None | Some("all") => true,
            Some(month) => calendar.month_key(case.created_at) == month,
        }
    }

    pub fn apply(&self, cases: Vec<DentalCase>, calendar: &LabCalendar) -> Vec<DentalCase> {
        cases
            .into_iter()
            .filter(|c| self.matches(c, calendar))
            .collect()
    }
}

/// Distinct `yyyy-MM` months that have cases, newest first.
pub fn month_options(cases: &[DentalCase], calendar: &LabCalendar) -> Vec<String> {
    let months: BTreeSet<String> = cases
        .iter()
        .map(|c| calendar.month_key(c.created_at))
        .collect();
    months.into_iter().rev().collect()
}

/// Order by creation time, newest first.
pub fn sort_newest_first(cases: &mut [DentalCase]) {
    cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

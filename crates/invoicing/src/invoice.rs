use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dentlab_cases::{DentalCase, Material};
use dentlab_core::{DomainError, DomainResult, Entity, InvoiceId, Money};

use crate::aggregate::InvoiceDraft;

/// One summary row: units billed for a material and their value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummaryItem {
    pub tooth_count: u64,
    /// Unit price in minor units.
    pub price: Money,
    /// `tooth_count × price`.
    pub total: Money,
}

/// Persisted invoice snapshot.
///
/// Write-once: built from a computed draft and never mutated afterwards. The
/// frozen case list is what was billed, regardless of later case edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: InvoiceId,
    dentist_name: String,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    summary: BTreeMap<Material, InvoiceSummaryItem>,
    subtotal: Money,
    paid_amount: Money,
    grand_total: Money,
    cases: Vec<DentalCase>,
    created_at: DateTime<Utc>,
}

impl Invoice {
    /// Freeze a computed draft.
    pub fn issue(id: InvoiceId, draft: InvoiceDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            dentist_name: draft.dentist_name,
            from_date: draft.period.from_date,
            to_date: draft.period.to_date,
            summary: draft.summary,
            subtotal: draft.subtotal,
            paid_amount: draft.paid_amount,
            grand_total: draft.grand_total,
            cases: draft.cases,
            created_at,
        }
    }

    /// Rebuild a stored snapshot, re-checking its arithmetic.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: InvoiceId,
        dentist_name: String,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        summary: BTreeMap<Material, InvoiceSummaryItem>,
        subtotal: Money,
        paid_amount: Money,
        grand_total: Money,
        cases: Vec<DentalCase>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let invoice = Self {
            id,
            dentist_name,
            from_date,
            to_date,
            summary,
            subtotal,
            paid_amount,
            grand_total,
            cases,
            created_at,
        };
        invoice.verify_totals()?;
        Ok(invoice)
    }

    /// Invariants: each row total is `tooth_count × price`, the subtotal is
    /// their sum, and `grand_total = subtotal − paid_amount`.
    pub fn verify_totals(&self) -> DomainResult<()> {
        let mut sum = Money::ZERO;
        for (material, item) in &self.summary {
            let expected = item
                .price
                .checked_times(item.tooth_count)
                .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))?;
            if expected != item.total {
                return Err(DomainError::invariant(format!(
                    "summary total for {material} does not match units × price"
                )));
            }
            sum = sum
                .checked_add(item.total)
                .ok_or_else(|| DomainError::invariant("invoice subtotal overflow"))?;
        }
        if sum != self.subtotal {
            return Err(DomainError::invariant(
                "subtotal does not match summary totals",
            ));
        }
        if self.subtotal.checked_sub(self.paid_amount) != Some(self.grand_total) {
            return Err(DomainError::invariant(
                "grand total does not equal subtotal minus paid amount",
            ));
        }
        Ok(())
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn dentist_name(&self) -> &str {
        &self.dentist_name
    }

    pub fn from_date(&self) -> Option<NaiveDate> {
        self.from_date
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        self.to_date
    }

    pub fn summary(&self) -> &BTreeMap<Material, InvoiceSummaryItem> {
        &self.summary
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn paid_amount(&self) -> Money {
        self.paid_amount
    }

    pub fn grand_total(&self) -> Money {
        self.grand_total
    }

    pub fn cases(&self) -> &[DentalCase] {
        &self.cases
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dentlab_cases::{CaseFilter, CasePatch};
use dentlab_core::{DomainResult, Money};
use dentlab_invoicing::{InvoiceDraft, InvoicePeriod, InvoiceRequest, PriceTable};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnerLoginRequest {
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaseListQuery {
    /// Owner only: restrict to one dentist.
    pub dentist: Option<String>,
    /// Patient name search.
    pub q: Option<String>,
    /// `yyyy-MM` or `all`.
    pub month: Option<String>,
}

impl CaseListQuery {
    pub fn filter(&self, doctor_view: bool) -> CaseFilter {
        CaseFilter {
            patient_query: self.q.clone(),
            month: self.month.clone(),
            doctor_view,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DentistQuery {
    pub dentist: Option<String>,
}

/// Case edit form. `unitPriceInput` is the price as typed in major units
/// (`"30.5"`); a non-numeric value leaves the stored price alone. The
/// flattened `unitPrice` is the stored integer in minor units (hundredths),
/// matching what case responses carry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasePatchRequest {
    #[serde(flatten)]
    pub patch: CasePatch,
    #[serde(default)]
    pub unit_price_input: Option<String>,
}

impl CasePatchRequest {
    pub fn into_patch(self) -> CasePatch {
        match self.unit_price_input {
            Some(input) => self.patch.with_unit_price_input(&input),
            None => self.patch,
        }
    }
}

/// A price as typed in the invoice form, either a JSON number or text, in
/// major units (`30.5` or `"30.5"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

impl PriceInput {
    fn as_input(&self) -> String {
        match self {
            PriceInput::Number(n) => n.to_string(),
            PriceInput::Text(s) => s.clone(),
        }
    }
}

/// Invoice form. `prices` and `paidAmount` are typed major-unit amounts;
/// every amount in the response is an integer in minor units (hundredths),
/// so `"paidAmount": "30"` comes back as `3000`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequestBody {
    pub dentist_name: String,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    /// Overrides on top of the standard price list, keyed by material name.
    #[serde(default)]
    pub prices: BTreeMap<String, PriceInput>,
    /// Blank means nothing paid.
    #[serde(default)]
    pub paid_amount: Option<PriceInput>,
}

impl InvoiceRequestBody {
    /// Build the aggregation request. Returns the names of price entries
    /// that were ignored (unknown material or non-numeric price).
    pub fn into_request(self) -> DomainResult<(InvoiceRequest, Vec<String>)> {
        let period = InvoicePeriod::new(self.from_date, self.to_date)?;

        let typed: Vec<(String, String)> = self
            .prices
            .iter()
            .map(|(name, price)| (name.clone(), price.as_input()))
            .collect();
        let mut prices = PriceTable::default();
        let ignored = prices.apply_inputs(typed.iter().map(|(n, p)| (n.as_str(), p.as_str())));

        let paid_amount = match self.paid_amount.map(|p| p.as_input()) {
            Some(input) if !input.trim().is_empty() => Money::parse_input(&input)?,
            _ => Money::ZERO,
        };

        Ok((
            InvoiceRequest {
                dentist_name: self.dentist_name,
                period,
                prices,
                paid_amount,
            },
            ignored,
        ))
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePreviewResponse {
    #[serde(flatten)]
    pub draft: InvoiceDraft,
    pub ignored_prices: Vec<String>,
}

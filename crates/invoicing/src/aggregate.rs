//! Invoice computation over a doctor's cases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dentlab_cases::{DentalCase, LabCalendar, Material};
use dentlab_core::{DomainError, DomainResult, Money};

use crate::invoice::InvoiceSummaryItem;
use crate::period::InvoicePeriod;
use crate::price::PriceTable;

/// Inputs of one invoice computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub dentist_name: String,
    #[serde(flatten)]
    pub period: InvoicePeriod,
    pub prices: PriceTable,
    pub paid_amount: Money,
}

impl InvoiceRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.dentist_name.trim().is_empty() {
            return Err(DomainError::validation("dentist name is required"));
        }
        if self.paid_amount.is_negative() {
            return Err(DomainError::validation("paid amount must not be negative"));
        }
        self.period.validate()
    }
}

/// Computed, not yet persisted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub dentist_name: String,
    #[serde(flatten)]
    pub period: InvoicePeriod,
    pub summary: BTreeMap<Material, InvoiceSummaryItem>,
    pub subtotal: Money,
    pub paid_amount: Money,
    pub grand_total: Money,
    /// Cases that were billed, in input order.
    pub cases: Vec<DentalCase>,
}

/// Aggregate cases into an invoice draft.
///
/// 1. Keep cases of `request.dentist_name` that are not deleted and were
///    created inside the period.
/// 2. Credit each case's tooth count to **every** known material it lists. A
///    case naming two materials bills its teeth under both.
/// 3. `total = tooth_count × price`, `subtotal = Σ total`,
///    `grand_total = subtotal − paid_amount` (may be negative).
///
/// Returns `Ok(None)` when no case survives the filter.
pub fn compute_invoice(
    cases: &[DentalCase],
    request: &InvoiceRequest,
    calendar: &LabCalendar,
) -> DomainResult<Option<InvoiceDraft>> {
    request.validate()?;

    let billed: Vec<DentalCase> = cases
        .iter()
        .filter(|c| c.dentist_name == request.dentist_name)
        .filter(|c| !c.is_deleted)
        .filter(|c| request.period.contains(c.created_at, calendar))
        .cloned()
        .collect();

    if billed.is_empty() {
        return Ok(None);
    }

    let mut units: BTreeMap<Material, u64> = Material::ALL.into_iter().map(|m| (m, 0)).collect();
    for case in &billed {
        let teeth = case.tooth_count();
        for material in case.materials() {
            let count = units.entry(material).or_insert(0);
            *count = count
                .checked_add(teeth)
                .ok_or_else(|| DomainError::invariant("tooth count overflow"))?;
        }
    }

    let mut summary = BTreeMap::new();
    let mut subtotal = Money::ZERO;
    for (material, tooth_count) in units {
        let price = request.prices.price(material);
        let total = price
            .checked_times(tooth_count)
            .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))?;
        subtotal = subtotal
            .checked_add(total)
            .ok_or_else(|| DomainError::invariant("invoice subtotal overflow"))?;
        summary.insert(
            material,
            InvoiceSummaryItem {
                tooth_count,
                price,
                total,
            },
        );
    }

    let grand_total = subtotal
        .checked_sub(request.paid_amount)
        .ok_or_else(|| DomainError::invariant("invoice grand total overflow"))?;

    Ok(Some(InvoiceDraft {
        dentist_name: request.dentist_name.clone(),
        period: request.period,
        summary,
        subtotal,
        paid_amount: request.paid_amount,
        grand_total,
        cases: billed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use dentlab_cases::NewCase;
    use dentlab_core::CaseId;
    use proptest::prelude::*;

    const DENTIST: &str = "Dr. Omar";

    fn case(dentist: &str, teeth: &str, material: &str, at: DateTime<Utc>) -> DentalCase {
        DentalCase::create(
            CaseId::new(),
            NewCase {
                patient_name: "Yousef Nasser".to_string(),
                dentist_name: dentist.to_string(),
                tooth_numbers: teeth.to_string(),
                prosthesis_type: "Separate".to_string(),
                material: material.to_string(),
                shade: "A2".to_string(),
                delivery_date: None,
                notes: None,
                source: None,
                patient_number: None,
            },
            at,
        )
        .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn request(paid: Money) -> InvoiceRequest {
        InvoiceRequest {
            dentist_name: DENTIST.to_string(),
            period: InvoicePeriod::default(),
            prices: PriceTable::default(),
            paid_amount: paid,
        }
    }

    #[test]
    fn three_zirconia_teeth_bill_ninety() {
        let cases = vec![case(DENTIST, "11,12,13", "Zirconia", at(2024, 5, 2, 9))];
        let mut prices = PriceTable::zeroed();
        prices.set(Material::Zirconia, Money::from_major(30));
        let req = InvoiceRequest {
            prices,
            ..request(Money::ZERO)
        };

        let draft = compute_invoice(&cases, &req, &LabCalendar::utc()).unwrap().unwrap();
        let zirconia = draft.summary[&Material::Zirconia];
        assert_eq!(zirconia.tooth_count, 3);
        assert_eq!(zirconia.total, Money::from_major(90));
        assert_eq!(draft.subtotal, Money::from_major(90));
        assert_eq!(draft.grand_total, Money::from_major(90));
    }

    #[test]
    fn multi_material_case_credits_teeth_to_each_material() {
        let cases = vec![case(DENTIST, "21,22", "Zirconia, Implant", at(2024, 5, 2, 9))];
        let draft = compute_invoice(&cases, &request(Money::ZERO), &LabCalendar::utc())
            .unwrap()
            .unwrap();

        assert_eq!(draft.summary[&Material::Zirconia].tooth_count, 2);
        assert_eq!(draft.summary[&Material::Implant].tooth_count, 2);
        // 2 × 30 + 2 × 50
        assert_eq!(draft.subtotal, Money::from_major(160));
    }

    #[test]
    fn summary_lists_every_material_even_when_unused() {
        let cases = vec![case(DENTIST, "11", "Zolid", at(2024, 5, 2, 9))];
        let draft = compute_invoice(&cases, &request(Money::ZERO), &LabCalendar::utc())
            .unwrap()
            .unwrap();
        assert_eq!(draft.summary.len(), Material::ALL.len());
        assert_eq!(draft.summary[&Material::MookUp].tooth_count, 0);
        assert_eq!(draft.summary[&Material::MookUp].total, Money::ZERO);
    }

    #[test]
    fn filters_other_dentists_and_deleted_cases() {
        let mut deleted = case(DENTIST, "11,12", "Zirconia", at(2024, 5, 2, 9));
        deleted.soft_delete().unwrap();
        let cases = vec![
            case(DENTIST, "11", "Zirconia", at(2024, 5, 2, 9)),
            case("Dr. Huda", "11,12,13,14", "Zirconia", at(2024, 5, 2, 9)),
            deleted,
        ];

        let draft = compute_invoice(&cases, &request(Money::ZERO), &LabCalendar::utc())
            .unwrap()
            .unwrap();
        assert_eq!(draft.cases.len(), 1);
        assert_eq!(draft.summary[&Material::Zirconia].tooth_count, 1);
    }

    #[test]
    fn date_range_uses_start_and_end_of_day() {
        let cases = vec![
            case(DENTIST, "11", "Zolid", at(2024, 4, 30, 23)),
            case(DENTIST, "11", "Zolid", at(2024, 5, 1, 0)),
            case(DENTIST, "11", "Zolid", at(2024, 5, 31, 23)),
            case(DENTIST, "11", "Zolid", at(2024, 6, 1, 0)),
        ];
        let req = InvoiceRequest {
            period: InvoicePeriod::new(NaiveDate::from_ymd_opt(2024, 5, 1), NaiveDate::from_ymd_opt(2024, 5, 31))
                .unwrap(),
            ..request(Money::ZERO)
        };

        let draft = compute_invoice(&cases, &req, &LabCalendar::utc()).unwrap().unwrap();
        assert_eq!(draft.cases.len(), 2);
        assert_eq!(draft.summary[&Material::Zolid].tooth_count, 2);
    }

    #[test]
    fn paid_amount_above_subtotal_goes_negative() {
        let cases = vec![case(DENTIST, "11", "MookUp", at(2024, 5, 2, 9))];
        let draft = compute_invoice(&cases, &request(Money::from_major(25)), &LabCalendar::utc())
            .unwrap()
            .unwrap();
        assert_eq!(draft.subtotal, Money::from_major(10));
        assert_eq!(draft.grand_total, Money::from_major(-15));
    }

    #[test]
    fn no_cases_in_range_yields_no_invoice() {
        let cases = vec![case(DENTIST, "11", "Zolid", at(2024, 1, 2, 9))];
        let req = InvoiceRequest {
            period: InvoicePeriod::new(NaiveDate::from_ymd_opt(2024, 5, 1), None).unwrap(),
            ..request(Money::ZERO)
        };
        assert_eq!(compute_invoice(&cases, &req, &LabCalendar::utc()).unwrap(), None);
        assert_eq!(compute_invoice(&[], &request(Money::ZERO), &LabCalendar::utc()).unwrap(), None);
    }

    #[test]
    fn negative_paid_amount_is_rejected() {
        let cases = vec![case(DENTIST, "11", "Zolid", at(2024, 1, 2, 9))];
        let err = compute_invoice(&cases, &request(Money::from_minor(-1)), &LabCalendar::utc())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    fn material_list() -> impl Strategy<Value = String> {
        proptest::sample::subsequence(
            vec!["Zolid", "Zirconia", "Nickel Free", "N-Guard", "Implant", "MookUp"],
            1..4,
        )
        .prop_map(|ms| ms.join(", "))
    }

    proptest! {
        #[test]
        fn subtotal_is_sum_of_totals_and_grand_total_subtracts_paid(
            specs in proptest::collection::vec((1usize..6, material_list()), 1..20),
            paid in 0i64..100_000,
        ) {
            let cases: Vec<DentalCase> = specs
                .iter()
                .map(|(n, m)| {
                    let teeth = (0..*n).map(|i| (11 + i).to_string()).collect::<Vec<_>>().join(",");
                    case(DENTIST, &teeth, m, at(2024, 5, 2, 9))
                })
                .collect();
            let draft = compute_invoice(&cases, &request(Money::from_minor(paid)), &LabCalendar::utc())
                .unwrap()
                .unwrap();

            let mut sum = Money::ZERO;
            for item in draft.summary.values() {
                prop_assert_eq!(Some(item.total), item.price.checked_times(item.tooth_count));
                sum = sum.checked_add(item.total).unwrap();
            }
            prop_assert_eq!(draft.subtotal, sum);
            prop_assert_eq!(draft.grand_total.minor(), draft.subtotal.minor() - paid);
        }
    }
}

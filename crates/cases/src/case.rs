use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use dentlab_core::{CaseId, DomainError, DomainResult, Entity, Money};

use crate::material::{Material, ProsthesisType};

/// Where a case was submitted from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseSource {
    Mobile,
    Desktop,
}

impl CaseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseSource::Mobile => "Mobile",
            CaseSource::Desktop => "Desktop",
        }
    }
}

/// Number of non-blank comma-separated tokens in a tooth-number list.
///
/// `"11, 12,,13 "` counts three teeth.
pub fn count_teeth(tooth_numbers: &str) -> u64 {
    tooth_numbers
        .split(',')
        .filter(|t| !t.trim().is_empty())
        .count() as u64
}

/// A dental-lab work order submitted for a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DentalCase {
    pub id: CaseId,
    pub patient_name: String,
    pub dentist_name: String,
    /// Comma-separated tooth numbers, e.g. `"11,12,13"`.
    pub tooth_numbers: String,
    pub prosthesis_type: String,
    /// Comma-separated material names, e.g. `"Zirconia, Implant"`.
    pub material: String,
    pub shade: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<CaseSource>,
    #[serde(default)]
    pub patient_number: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deletion_requested: bool,
    #[serde(default)]
    pub unit_price: Option<Money>,
}

impl Entity for DentalCase {
    type Id = CaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Submission form for a new case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    pub patient_name: String,
    pub dentist_name: String,
    pub tooth_numbers: String,
    pub prosthesis_type: String,
    pub material: String,
    pub shade: String,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<CaseSource>,
    #[serde(default)]
    pub patient_number: Option<String>,
}

impl NewCase {
    /// Form-level validation; blocks submission on the first failing field.
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(
            &self.patient_name,
            &self.dentist_name,
            &self.tooth_numbers,
            &self.prosthesis_type,
            &self.material,
            &self.shade,
        )
    }
}

fn validate_fields(
    patient_name: &str,
    dentist_name: &str,
    tooth_numbers: &str,
    prosthesis_type: &str,
    material: &str,
    shade: &str,
) -> DomainResult<()> {
    if patient_name.trim().chars().count() < 2 {
        return Err(DomainError::validation(
            "patient name must be at least 2 characters",
        ));
    }
    if dentist_name.trim().chars().count() < 2 {
        return Err(DomainError::validation(
            "dentist name must be at least 2 characters",
        ));
    }
    if count_teeth(tooth_numbers) == 0 {
        return Err(DomainError::validation(
            "at least one tooth number is required",
        ));
    }
    prosthesis_type.parse::<ProsthesisType>()?;

    let mut any_material = false;
    for token in material.split(',').filter(|t| !t.trim().is_empty()) {
        token.parse::<Material>()?;
        any_material = true;
    }
    if !any_material {
        return Err(DomainError::validation("a material must be selected"));
    }

    if shade.trim().is_empty() {
        return Err(DomainError::validation("shade is required"));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DentalCase {
    /// Validate a submission and stamp it with an id and creation time.
    pub fn create(id: CaseId, new_case: NewCase, created_at: DateTime<Utc>) -> DomainResult<Self> {
        new_case.validate()?;
        Ok(Self {
            id,
            patient_name: new_case.patient_name.trim().to_string(),
            dentist_name: new_case.dentist_name.trim().to_string(),
            tooth_numbers: new_case.tooth_numbers.trim().to_string(),
            prosthesis_type: new_case.prosthesis_type.trim().to_string(),
            material: new_case.material.trim().to_string(),
            shade: new_case.shade.trim().to_string(),
            created_at,
            delivery_date: new_case.delivery_date,
            notes: non_blank(new_case.notes),
            source: new_case.source,
            patient_number: non_blank(new_case.patient_number),
            is_deleted: false,
            deletion_requested: false,
            unit_price: None,
        })
    }

    pub fn tooth_count(&self) -> u64 {
        count_teeth(&self.tooth_numbers)
    }

    /// Trimmed, non-empty material tokens as written on the case.
    pub fn material_tokens(&self) -> impl Iterator<Item = &str> {
        self.material
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Material tokens that name a known material. Unknown tokens are skipped.
    pub fn materials(&self) -> impl Iterator<Item = Material> + '_ {
        self.material_tokens().filter_map(Material::from_name)
    }

    /// Hidden from the doctor once a requested deletion has been carried out.
    pub fn is_visible_to_doctor(&self) -> bool {
        !(self.deletion_requested && self.is_deleted)
    }

    /// Doctor asks the owner to remove this case.
    pub fn request_deletion(&mut self) -> DomainResult<()> {
        if self.is_deleted {
            return Err(DomainError::conflict("case is already deleted"));
        }
        if self.deletion_requested {
            return Err(DomainError::conflict("deletion already requested"));
        }
        self.deletion_requested = true;
        Ok(())
    }

    /// Owner marks the case deleted while keeping the record.
    pub fn soft_delete(&mut self) -> DomainResult<()> {
        if self.is_deleted {
            return Err(DomainError::conflict("case is already deleted"));
        }
        self.is_deleted = true;
        Ok(())
    }

    /// Owner undoes a soft delete. A pending deletion request is dropped too.
    pub fn restore(&mut self) -> DomainResult<()> {
        if !self.is_deleted {
            return Err(DomainError::conflict("case is not deleted"));
        }
        self.is_deleted = false;
        self.deletion_requested = false;
        Ok(())
    }

    /// Apply an edit and re-validate. On error the case is left unchanged.
    pub fn apply_patch(&mut self, patch: CasePatch) -> DomainResult<()> {
        let mut next = self.clone();

        if let Some(v) = patch.patient_name {
            next.patient_name = v.trim().to_string();
        }
        if let Some(v) = patch.dentist_name {
            next.dentist_name = v.trim().to_string();
        }
        if let Some(v) = patch.tooth_numbers {
            next.tooth_numbers = v.trim().to_string();
        }
        if let Some(v) = patch.prosthesis_type {
            next.prosthesis_type = v.trim().to_string();
        }
        if let Some(v) = patch.material {
            next.material = v.trim().to_string();
        }
        if let Some(v) = patch.shade {
            next.shade = v.trim().to_string();
        }
        if let Some(v) = patch.delivery_date {
            next.delivery_date = v;
        }
        if let Some(v) = patch.notes {
            next.notes = non_blank(v);
        }
        if let Some(v) = patch.patient_number {
            next.patient_number = non_blank(v);
        }
        if let Some(v) = patch.unit_price {
            next.unit_price = v;
        }
        if let Some(v) = patch.is_deleted {
            next.is_deleted = v;
        }
        if let Some(v) = patch.deletion_requested {
            next.deletion_requested = v;
        }

        validate_fields(
            &next.patient_name,
            &next.dentist_name,
            &next.tooth_numbers,
            &next.prosthesis_type,
            &next.material,
            &next.shade,
        )?;

        *self = next;
        Ok(())
    }
}

/// Partial update of a case. `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasePatch {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub dentist_name: Option<String>,
    #[serde(default)]
    pub tooth_numbers: Option<String>,
    #[serde(default)]
    pub prosthesis_type: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub shade: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub delivery_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub patient_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit_price: Option<Option<Money>>,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub deletion_requested: Option<bool>,
}

impl CasePatch {
    pub fn is_empty(&self) -> bool {
        *self == CasePatch::default()
    }

    /// Set the unit price from a typed input: empty means zero, a
    /// non-numeric input leaves the current price as it is.
    pub fn with_unit_price_input(mut self, input: &str) -> Self {
        if input.trim().is_empty() {
            self.unit_price = Some(Some(Money::ZERO));
        } else if let Ok(price) = Money::parse_input(input) {
            self.unit_price = Some(Some(price));
        }
        self
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

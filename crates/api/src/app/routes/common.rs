use std::str::FromStr;

use dentlab_core::DomainError;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse()?)
}

/// Whose records a listing covers. Doctors always get their own; the owner
/// gets everyone unless `requested` names one dentist.
pub fn dentist_scope(
    principal: &PrincipalContext,
    requested: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let requested = requested.map(str::trim).filter(|d| !d.is_empty());
    if principal.is_owner() {
        return Ok(requested.map(str::to_string));
    }
    if let Some(dentist) = requested {
        principal.ensure_can_access_dentist(dentist)?;
    }
    Ok(Some(principal.name().to_string()))
}

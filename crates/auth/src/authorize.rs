use thiserror::Error;

use crate::permissions::Permission;
use crate::principal::Principal;
use crate::roles::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: records belong to another dentist")]
    OtherDentist,
}

/// Role → permission mapping.
///
/// The owner holds the wildcard; doctors work on their own cases, invoices
/// and inbox. Unknown roles get nothing.
pub fn permissions_for_role(role: &Role) -> Vec<Permission> {
    if role.is_owner() {
        return vec![Permission::ALL];
    }
    if *role == Role::DOCTOR {
        return vec![
            Permission::CASES_CREATE,
            Permission::CASES_READ_OWN,
            Permission::CASES_REQUEST_DELETION,
            Permission::INVOICES_PREVIEW,
            Permission::INVOICES_READ_OWN,
            Permission::NOTIFICATIONS_OWN,
        ];
    }
    Vec::new()
}

/// Authorize a principal for a permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = permissions_for_role(&principal.role);
    if granted.iter().any(|p| p.is_wildcard() || p == required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

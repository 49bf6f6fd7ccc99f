use dentlab_auth::{Permission, Principal};

use crate::app::errors::ApiError;

/// Authenticated caller for a request, resolved from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn name(&self) -> &str {
        &self.principal.name
    }

    pub fn is_owner(&self) -> bool {
        self.principal.is_owner()
    }

    pub fn require(&self, permission: &Permission) -> Result<(), ApiError> {
        Ok(self.principal.require(permission)?)
    }

    pub fn ensure_can_access_dentist(&self, dentist_name: &str) -> Result<(), ApiError> {
        Ok(self.principal.ensure_can_access_dentist(dentist_name)?)
    }
}

use dentlab_core::UserId;

use crate::authorize::{AuthzError, authorize};
use crate::permissions::Permission;
use crate::roles::Role;

/// Inbox name used for owner-directed notifications.
pub const OWNER_INBOX: &str = "owner";

/// An authenticated caller, resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Doctor name as stored on cases, or `"owner"`.
    pub name: String,
    pub role: Role,
    pub user_id: Option<UserId>,
}

impl Principal {
    pub fn owner() -> Self {
        Self {
            name: OWNER_INBOX.to_string(),
            role: Role::OWNER,
            user_id: None,
        }
    }

    pub fn doctor(name: impl Into<String>, user_id: UserId) -> Self {
        Self {
            name: name.into(),
            role: Role::DOCTOR,
            user_id: Some(user_id),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role.is_owner()
    }

    pub fn require(&self, permission: &Permission) -> Result<(), AuthzError> {
        authorize(self, permission)
    }

    /// Owners see every dentist's records; doctors only their own.
    pub fn ensure_can_access_dentist(&self, dentist_name: &str) -> Result<(), AuthzError> {
        if self.is_owner() || self.name == dentist_name {
            Ok(())
        } else {
            Err(AuthzError::OtherDentist)
        }
    }

    /// Notification inbox this principal reads.
    pub fn inbox(&self) -> &str {
        if self.is_owner() { OWNER_INBOX } else { &self.name }
    }
}

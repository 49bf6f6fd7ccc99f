use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "cases.create").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const ALL: Permission = Permission(Cow::Borrowed("*"));

    pub const CASES_CREATE: Permission = Permission(Cow::Borrowed("cases.create"));
    pub const CASES_READ_OWN: Permission = Permission(Cow::Borrowed("cases.read_own"));
    pub const CASES_EDIT: Permission = Permission(Cow::Borrowed("cases.edit"));
    pub const CASES_DELETE: Permission = Permission(Cow::Borrowed("cases.delete"));
    pub const CASES_REQUEST_DELETION: Permission =
        Permission(Cow::Borrowed("cases.request_deletion"));

    pub const INVOICES_PREVIEW: Permission = Permission(Cow::Borrowed("invoices.preview"));
    pub const INVOICES_READ_OWN: Permission = Permission(Cow::Borrowed("invoices.read_own"));
    pub const INVOICES_ISSUE: Permission = Permission(Cow::Borrowed("invoices.issue"));
    pub const INVOICES_DELETE: Permission = Permission(Cow::Borrowed("invoices.delete"));

    pub const USERS_MANAGE: Permission = Permission(Cow::Borrowed("users.manage"));
    pub const LOGIN_LOGS_READ: Permission = Permission(Cow::Borrowed("login_logs.read"));
    pub const NOTIFICATIONS_OWN: Permission = Permission(Cow::Borrowed("notifications.own"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

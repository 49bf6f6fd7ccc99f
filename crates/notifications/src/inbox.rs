use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dentlab_core::{Entity, NotificationId};

/// An in-app message waiting in a recipient's inbox.
///
/// The recipient is a doctor name or the owner inbox (`"owner"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "dentistName")]
    pub recipient: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: NotificationId,
        recipient: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            recipient: recipient.into(),
            message: message.into(),
            read: false,
            created_at,
        }
    }

    /// Owner alert written whenever a case is submitted.
    pub fn new_case(id: NotificationId, owner_inbox: &str, dentist_name: &str, at: DateTime<Utc>) -> Self {
        Self::new(id, owner_inbox, format!("New Case From {dentist_name}"), at)
    }

    /// Owner alert written when a doctor asks for a case to be removed.
    pub fn deletion_requested(
        id: NotificationId,
        owner_inbox: &str,
        dentist_name: &str,
        patient_name: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            owner_inbox,
            format!("Deletion Requested By {dentist_name} For {patient_name}"),
            at,
        )
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

impl Entity for Notification {
    type Id = NotificationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

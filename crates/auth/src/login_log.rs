use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use dentlab_core::{Entity, LoginLogId};

/// How long login entries are kept, in hours.
pub const LOGIN_LOG_RETENTION_HOURS: i64 = 24;

/// A doctor sign-in, shown to the owner for the last day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLog {
    pub id: LoginLogId,
    pub dentist_name: String,
    pub timestamp: DateTime<Utc>,
}

impl LoginLog {
    pub fn new(dentist_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: LoginLogId::new(),
            dentist_name: dentist_name.into(),
            timestamp,
        }
    }

    /// Entries strictly older than this are pruned.
    pub fn cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(LOGIN_LOG_RETENTION_HOURS)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.timestamp < Self::cutoff(now)
    }
}

impl Entity for LoginLog {
    type Id = LoginLogId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_after_a_day() {
        let now = Utc::now();
        assert!(!LoginLog::new("Dr. Omar", now - Duration::hours(23)).is_expired(now));
        assert!(!LoginLog::new("Dr. Omar", LoginLog::cutoff(now)).is_expired(now));
        assert!(LoginLog::new("Dr. Omar", now - Duration::hours(25)).is_expired(now));
    }
}

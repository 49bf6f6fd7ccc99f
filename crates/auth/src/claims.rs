use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dentlab_core::UserId;

use crate::{Principal, Role};

/// Session token claims (transport-agnostic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the doctor's name, or `"owner"`.
    pub sub: String,

    /// Backing user record for doctor sessions.
    #[serde(default)]
    pub user_id: Option<UserId>,

    pub role: Role,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    pub fn for_principal(principal: &Principal, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            sub: principal.name.clone(),
            user_id: principal.user_id,
            role: principal.role.clone(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            name: self.sub.clone(),
            role: self.role.clone(),
            user_id: self.user_id,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate session claims.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::jwt`].
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

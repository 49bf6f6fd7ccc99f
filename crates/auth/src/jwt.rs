//! HS256 session tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{SessionClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("malformed or badly signed token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies bearer tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, JwtError>;
}

/// Shared-secret HS256 token codec.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String, JwtError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, JwtError> {
        // Time checks run on our own claim names, not `exp`/`iat`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Principal;
    use chrono::Duration;
    use dentlab_core::UserId;

    #[test]
    fn issued_token_validates_with_same_secret() {
        let jwt = Hs256Jwt::new("secret");
        let now = Utc::now();
        let claims = SessionClaims::for_principal(
            &Principal::doctor("Dr. Omar", UserId::new()),
            now,
            Duration::hours(8),
        );
        let token = jwt.issue(&claims).unwrap();
        assert_eq!(jwt.validate(&token, now).unwrap(), claims);
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let now = Utc::now();
        let claims = SessionClaims::for_principal(&Principal::owner(), now, Duration::hours(1));
        let token = Hs256Jwt::new("one").issue(&claims).unwrap();
        assert!(matches!(
            Hs256Jwt::new("two").validate(&token, now),
            Err(JwtError::Decode(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = Hs256Jwt::new("secret");
        let now = Utc::now();
        let claims = SessionClaims::for_principal(&Principal::owner(), now, Duration::minutes(1));
        let token = jwt.issue(&claims).unwrap();
        assert!(matches!(
            jwt.validate(&token, now + Duration::minutes(2)),
            Err(JwtError::Claims(TokenValidationError::Expired))
        ));
    }
}

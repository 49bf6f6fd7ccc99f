//! `dentlab-auth`: users, sessions and role-based authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod login_log;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize, permissions_for_role};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtError, JwtValidator};
pub use login_log::{LOGIN_LOG_RETENTION_HOURS, LoginLog};
pub use permissions::Permission;
pub use principal::{OWNER_INBOX, Principal};
pub use roles::Role;
pub use user::{NewUser, User, UserPatch, ensure_unique_name, find_by_credentials, names_match};

//! `dentlab-core`: domain building blocks shared by every lab module.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CaseId, InvoiceId, LoginLogId, NotificationId, UserId};
pub use money::Money;

//! Infrastructure layer: repositories over in-memory and Postgres storage.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

pub use error::{RepoResult, RepositoryError};
pub use repository::{
    CaseChange, CaseRepository, InvoiceRepository, LoginLogRepository, NotificationRepository,
    UserRepository,
};
pub use store::Repositories;

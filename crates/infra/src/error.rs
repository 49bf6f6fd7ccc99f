use thiserror::Error;

use dentlab_core::DomainError;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Storage-layer failure.
///
/// - **NotFound**: no record with the requested id
/// - **Conflict**: a uniqueness rule or lifecycle rule rejected the write
/// - **PermissionDenied**: the database refused the operation (SQLSTATE `42501`)
/// - **Domain**: the record change itself failed validation
/// - **Backend**: connection, pool, or serialization failure
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Domain(DomainError),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<DomainError> for RepositoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => RepositoryError::NotFound,
            DomainError::Conflict(msg) => RepositoryError::Conflict(msg),
            other => RepositoryError::Domain(other),
        }
    }
}

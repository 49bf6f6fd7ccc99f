//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (insufficient privilege) | `42501` | `PermissionDenied` |
//! | Database (other) | Any other | `Backend` |
//! | RowNotFound | N/A | `NotFound` |
//! | Other | N/A | `Backend` |
//!
//! ## Thread Safety
//!
//! Every repository holds a clone of one `PgPool`, which is `Send + Sync`.

mod cases;
mod inbox;
mod invoices;
mod users;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

pub use cases::PostgresCaseRepository;
pub use inbox::{PostgresLoginLogRepository, PostgresNotificationRepository};
pub use invoices::PostgresInvoiceRepository;
pub use users::PostgresUserRepository;

use crate::error::RepositoryError;

const SCHEMA: &str = include_str!("schema.sql");

/// Open a pool and apply the embedded schema.
#[instrument(skip(database_url), err)]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;
    apply_schema(&pool).await?;
    Ok(pool)
}

pub async fn apply_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    Ok(())
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => RepositoryError::Conflict(msg),
                Some("42501") => RepositoryError::PermissionDenied(msg),
                _ => RepositoryError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::PoolClosed => {
            RepositoryError::Backend(format!("connection pool closed in {}", operation))
        }
        other => RepositoryError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}

/// Rows touched by a delete/update; zero means the id was unknown.
pub(crate) fn require_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

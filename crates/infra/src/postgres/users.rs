use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use dentlab_auth::{NewUser, User, UserPatch, ensure_unique_name};
use dentlab_core::UserId;

use super::{map_sqlx_error, require_row};
use crate::error::{RepoResult, RepositoryError};
use crate::repository::UserRepository;

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        password: row.try_get("password")?,
        welcome_message: row.try_get("welcome_message")?,
    })
}

/// Unique-index violations on `lower(name)` become a readable conflict.
fn name_conflict(operation: &str, err: sqlx::Error) -> RepositoryError {
    match map_sqlx_error(operation, err) {
        RepositoryError::Conflict(_) => {
            RepositoryError::Conflict("a user with this name already exists".to_string())
        }
        other => other,
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self), err)]
    async fn list(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, password, welcome_message FROM users ORDER BY lower(name)")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter()
            .map(user_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_users", e))
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: UserId) -> RepoResult<User> {
        let row = sqlx::query("SELECT id, name, password, welcome_message FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?
            .ok_or(RepositoryError::NotFound)?;
        user_from_row(&row).map_err(|e| map_sqlx_error("get_user", e))
    }

    #[instrument(skip(self, new_user), err)]
    async fn add(&self, id: UserId, new_user: NewUser) -> RepoResult<User> {
        let user = User::create(id, new_user)?;
        sqlx::query("INSERT INTO users (id, name, password, welcome_message) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.name)
            .bind(&user.password)
            .bind(&user.welcome_message)
            .execute(&self.pool)
            .await
            .map_err(|e| name_conflict("add_user", e))?;
        Ok(user)
    }

    /// Check-then-write inside one transaction. The table lock serializes
    /// concurrent renames; the unique index backs it up.
    #[instrument(skip(self, patch), err)]
    async fn update(&self, id: UserId, patch: UserPatch) -> RepoResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;

        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;

        let rows = sqlx::query("SELECT id, name, password, welcome_message FROM users")
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        let users: Vec<User> = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("update_user", e))?;

        let mut next = users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        next.apply_patch(patch)?;
        ensure_unique_name(&users, &next.name, Some(id))?;

        let result = sqlx::query(
            "UPDATE users SET name = $2, password = $3, welcome_message = $4 WHERE id = $1",
        )
        .bind(next.id.as_uuid())
        .bind(&next.name)
        .bind(&next.password)
        .bind(&next.welcome_message)
        .execute(&mut *tx)
        .await
        .map_err(|e| name_conflict("update_user", e))?;
        require_row(result.rows_affected())?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        Ok(next)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: UserId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        require_row(result.rows_affected())
    }

    #[instrument(skip(self, password), err)]
    async fn verify(&self, name: &str, password: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, password, welcome_message FROM users \
             WHERE lower(name) = lower($1) AND password = $2",
        )
        .bind(name.trim())
        .bind(password)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("verify_user", e))?;
        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("verify_user", e))
    }
}

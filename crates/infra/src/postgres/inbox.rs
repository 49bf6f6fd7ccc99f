//! Notifications and login logs.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use dentlab_auth::LoginLog;
use dentlab_core::{LoginLogId, NotificationId};
use dentlab_notifications::Notification;

use super::{map_sqlx_error, require_row};
use crate::error::{RepoResult, RepositoryError};
use crate::repository::{LoginLogRepository, NotificationRepository};

#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn notification_from_row(row: &PgRow) -> Result<Notification, sqlx::Error> {
    Ok(Notification {
        id: NotificationId::from_uuid(row.try_get::<Uuid, _>("id")?),
        recipient: row.try_get("dentist_name")?,
        message: row.try_get("message")?,
        read: row.try_get("read")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[instrument(skip(self, notification), fields(recipient = %notification.recipient), err)]
    async fn create(&self, notification: Notification) -> RepoResult<NotificationId> {
        sqlx::query(
            "INSERT INTO notifications (id, dentist_name, message, read, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(notification.id.as_uuid())
        .bind(&notification.recipient)
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_notification", e))?;
        Ok(notification.id)
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: NotificationId) -> RepoResult<Notification> {
        let row = sqlx::query(
            "SELECT id, dentist_name, message, read, created_at FROM notifications WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_notification", e))?
        .ok_or(RepositoryError::NotFound)?;
        notification_from_row(&row).map_err(|e| map_sqlx_error("get_notification", e))
    }

    #[instrument(skip(self), err)]
    async fn unread_for(&self, recipient: &str) -> RepoResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, dentist_name, message, read, created_at FROM notifications \
             WHERE dentist_name = $1 AND NOT read ORDER BY created_at DESC",
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("unread_notifications", e))?;
        rows.iter()
            .map(notification_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("unread_notifications", e))
    }

    #[instrument(skip(self), err)]
    async fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("mark_notification_read", e))?;
        require_row(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresLoginLogRepository {
    pool: PgPool,
}

impl PostgresLoginLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn login_log_from_row(row: &PgRow) -> Result<LoginLog, sqlx::Error> {
    Ok(LoginLog {
        id: LoginLogId::from_uuid(row.try_get::<Uuid, _>("id")?),
        dentist_name: row.try_get("dentist_name")?,
        timestamp: row.try_get("logged_at")?,
    })
}

#[async_trait::async_trait]
impl LoginLogRepository for PostgresLoginLogRepository {
    #[instrument(skip(self, entry), fields(dentist = %entry.dentist_name), err)]
    async fn record(&self, entry: LoginLog) -> RepoResult<()> {
        sqlx::query("INSERT INTO login_logs (id, dentist_name, logged_at) VALUES ($1, $2, $3)")
            .bind(entry.id.as_uuid())
            .bind(&entry.dentist_name)
            .bind(entry.timestamp)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("record_login", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn recent(&self, now: DateTime<Utc>) -> RepoResult<Vec<LoginLog>> {
        let cutoff = LoginLog::cutoff(now);
        sqlx::query("DELETE FROM login_logs WHERE logged_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("prune_login_logs", e))?;

        let rows = sqlx::query(
            "SELECT id, dentist_name, logged_at FROM login_logs ORDER BY logged_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_login_logs", e))?;

        rows.iter()
            .map(login_log_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("recent_login_logs", e))
    }
}

//! Service wiring: storage backend, session tokens and notification channels.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};

use dentlab_auth::{Hs256Jwt, Principal, SessionClaims};
use dentlab_cases::LabCalendar;
use dentlab_infra::{Repositories, postgres};
use dentlab_notifications::{EmailSender, NotificationSender, Notifier, WhatsAppSender};

use crate::app::dto::SessionResponse;
use crate::app::errors::ApiError;
use crate::config::{NotificationSettings, Settings};

pub struct AppServices {
    pub repos: Repositories,
    pub calendar: LabCalendar,
    pub sessions: Arc<Hs256Jwt>,
    pub token_ttl: chrono::Duration,
    pub owner_password: String,
    pub notifier: Notifier,
    pub permissions_help_url: Arc<str>,
}

impl AppServices {
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let repos = match settings.storage.database_url() {
            Some(url) => {
                let pool = postgres::connect(url, settings.storage.max_connections)
                    .await
                    .context("failed to connect to the case database")?;
                tracing::info!("using postgres storage");
                Repositories::postgres(pool)
            }
            None => {
                tracing::warn!("storage.database_url not set; records live in memory only");
                Repositories::in_memory()
            }
        };

        Ok(Self {
            repos,
            calendar: LabCalendar::from_offset_minutes(settings.lab.utc_offset_minutes),
            sessions: Arc::new(Hs256Jwt::new(settings.auth.jwt_secret_or_dev_default())),
            token_ttl: chrono::Duration::minutes(settings.auth.token_ttl_minutes),
            owner_password: settings.auth.owner_password_or_dev_default(),
            notifier: build_notifier(&settings.notifications)?,
            permissions_help_url: Arc::from(settings.storage.permissions_help_url.as_str()),
        })
    }

    /// Sign a session token for `principal`.
    pub fn issue_session(
        &self,
        principal: &Principal,
        welcome_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SessionResponse, ApiError> {
        let claims = SessionClaims::for_principal(principal, now, self.token_ttl);
        let token = self.sessions.issue(&claims)?;
        Ok(SessionResponse {
            token,
            name: principal.name.clone(),
            role: principal.role.to_string(),
            welcome_message,
            expires_at: claims.expires_at,
        })
    }
}

fn build_notifier(settings: &NotificationSettings) -> anyhow::Result<Notifier> {
    if !settings.enabled {
        tracing::info!("outbound notifications disabled");
        return Ok(Notifier::disabled());
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
        .context("failed to build notification http client")?;

    let senders: Vec<Arc<dyn NotificationSender>> = vec![
        Arc::new(WhatsAppSender::new(http.clone(), settings.twilio.clone())),
        Arc::new(EmailSender::new(http, settings.sendgrid.clone())),
    ];
    Ok(Notifier::new(senders))
}

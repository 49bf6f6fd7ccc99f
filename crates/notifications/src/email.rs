//! Email alerts through the SendGrid v3 mail API.

use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};

use crate::message::OutboundMessage;
use crate::report::{Channel, DeliveryReport, RecipientResult};
use crate::sender::NotificationSender;

pub const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SendGridSettings {
    pub api_key: Option<String>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

pub struct EmailSender {
    http: reqwest::Client,
    settings: SendGridSettings,
    api_base: String,
}

impl EmailSender {
    pub fn new(http: reqwest::Client, settings: SendGridSettings) -> Self {
        Self::with_api_base(http, settings, SENDGRID_API_BASE)
    }

    pub fn with_api_base(http: reqwest::Client, settings: SendGridSettings, api_base: impl Into<String>) -> Self {
        Self {
            http,
            settings,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait::async_trait]
impl NotificationSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    #[instrument(skip_all, fields(channel = "email"))]
    async fn send(&self, message: &OutboundMessage) -> DeliveryReport {
        let (api_key, sender, recipient) = match (
            present(&self.settings.api_key),
            present(&self.settings.sender),
            present(&self.settings.recipient),
        ) {
            (Some(k), Some(s), Some(r)) => (k, s, r),
            (k, s, r) => {
                let missing: Vec<&str> = [
                    (k.is_none(), "notifications.sendgrid.api_key"),
                    (s.is_none(), "notifications.sendgrid.sender"),
                    (r.is_none(), "notifications.sendgrid.recipient"),
                ]
                .into_iter()
                .filter_map(|(is_missing, name)| is_missing.then_some(name))
                .collect();
                return DeliveryReport::missing_settings(Channel::Email, &missing);
            }
        };

        let body = json!({
            "personalizations": [{ "to": [{ "email": recipient }] }],
            "from": { "email": sender },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        });

        let result = match self
            .http
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => RecipientResult::sent(recipient, None),
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                warn!(%status, %detail, "sendgrid rejected email");
                RecipientResult::failed(recipient, format!("Failed to send email notification (HTTP {status})."))
            }
            Err(e) => {
                warn!(error = %e, "sendgrid request failed");
                RecipientResult::failed(recipient, "Failed to send email notification.")
            }
        };

        DeliveryReport::from_results(Channel::Email, vec![result])
    }
}

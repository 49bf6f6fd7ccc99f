//! WhatsApp alerts through the Twilio Messages REST API.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::message::OutboundMessage;
use crate::report::{Channel, DeliveryReport, RecipientResult};
use crate::sender::NotificationSender;

pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Twilio error code for rejected account credentials.
const TWILIO_AUTH_FAILED: i64 = 20003;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TwilioSettings {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    /// Sender number, without the `whatsapp:` prefix.
    pub from: Option<String>,
    /// Comma-separated recipient numbers.
    pub to: Option<String>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

struct ResolvedTwilio<'a> {
    account_sid: &'a str,
    auth_token: &'a str,
    from: &'a str,
    recipients: Vec<&'a str>,
}

impl TwilioSettings {
    fn resolve(&self) -> Result<ResolvedTwilio<'_>, Vec<&'static str>> {
        let account_sid = present(&self.account_sid);
        let auth_token = present(&self.auth_token);
        let from = present(&self.from);
        let to = present(&self.to);

        let mut missing = Vec::new();
        if account_sid.is_none() {
            missing.push("notifications.twilio.account_sid");
        }
        if auth_token.is_none() {
            missing.push("notifications.twilio.auth_token");
        }
        if from.is_none() {
            missing.push("notifications.twilio.from");
        }
        if to.is_none() {
            missing.push("notifications.twilio.to");
        }

        match (account_sid, auth_token, from, to) {
            (Some(account_sid), Some(auth_token), Some(from), Some(to)) => Ok(ResolvedTwilio {
                account_sid,
                auth_token,
                from,
                recipients: to.split(',').map(str::trim).filter(|n| !n.is_empty()).collect(),
            }),
            _ => Err(missing),
        }
    }
}

#[derive(Debug, Error)]
enum TwilioError {
    #[error("Code N/A: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Code {code}: {message}")]
    Api { code: String, message: String },
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioFailure {
    code: Option<i64>,
    message: Option<String>,
}

pub struct WhatsAppSender {
    http: reqwest::Client,
    settings: TwilioSettings,
    api_base: String,
}

impl WhatsAppSender {
    pub fn new(http: reqwest::Client, settings: TwilioSettings) -> Self {
        Self::with_api_base(http, settings, TWILIO_API_BASE)
    }

    pub fn with_api_base(http: reqwest::Client, settings: TwilioSettings, api_base: impl Into<String>) -> Self {
        Self {
            http,
            settings,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn send_one(
        &self,
        creds: &ResolvedTwilio<'_>,
        to: &str,
        body: &str,
    ) -> Result<String, TwilioError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, creds.account_sid
        );
        let from = format!("whatsapp:{}", creds.from);
        let to = format!("whatsapp:{to}");

        let resp = self
            .http
            .post(&url)
            .basic_auth(creds.account_sid, Some(creds.auth_token))
            .form(&[("From", from.as_str()), ("To", to.as_str()), ("Body", body)])
            .send()
            .await?;

        if resp.status().is_success() {
            let message: TwilioMessage = resp.json().await?;
            return Ok(message.sid);
        }

        let status = resp.status();
        let failure: TwilioFailure = resp.json().await.unwrap_or(TwilioFailure {
            code: None,
            message: None,
        });
        let message = match failure.code {
            Some(TWILIO_AUTH_FAILED) => "Twilio Authentication Failed. Check notifications.twilio.account_sid \
                 and notifications.twilio.auth_token and restart the server."
                .to_string(),
            _ => failure
                .message
                .unwrap_or_else(|| format!("Twilio responded with HTTP {status}")),
        };
        Err(TwilioError::Api {
            code: failure
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            message,
        })
    }
}

#[async_trait::async_trait]
impl NotificationSender for WhatsAppSender {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    #[instrument(skip_all, fields(channel = "whatsapp"))]
    async fn send(&self, message: &OutboundMessage) -> DeliveryReport {
        let creds = match self.settings.resolve() {
            Ok(creds) => creds,
            Err(missing) => return DeliveryReport::missing_settings(Channel::WhatsApp, &missing),
        };
        if creds.recipients.is_empty() {
            return DeliveryReport::failed(
                Channel::WhatsApp,
                "No recipient numbers found in notifications.twilio.to.",
            );
        }

        let mut results = Vec::with_capacity(creds.recipients.len());
        for to in &creds.recipients {
            match self.send_one(&creds, to, &message.text).await {
                Ok(sid) => {
                    debug!(recipient = %to, %sid, "whatsapp message accepted");
                    results.push(RecipientResult::sent(*to, Some(sid)));
                }
                Err(e) => results.push(RecipientResult::failed(*to, e.to_string())),
            }
        }
        DeliveryReport::from_results(Channel::WhatsApp, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_lists_every_missing_setting() {
        let settings = TwilioSettings {
            account_sid: Some("AC1".to_string()),
            auth_token: Some("  ".to_string()),
            from: None,
            to: Some("+1".to_string()),
        };
        let missing = settings.resolve().err().unwrap();
        assert_eq!(
            missing,
            vec!["notifications.twilio.auth_token", "notifications.twilio.from"]
        );
    }

    #[test]
    fn recipients_are_split_on_commas() {
        let settings = TwilioSettings {
            account_sid: Some("AC1".to_string()),
            auth_token: Some("tok".to_string()),
            from: Some("+14155238886".to_string()),
            to: Some(" +100, ,+200 ".to_string()),
        };
        let resolved = settings.resolve().ok().unwrap();
        assert_eq!(resolved.recipients, vec!["+100", "+200"]);
    }

    #[tokio::test]
    async fn unconfigured_sender_reports_without_sending() {
        let sender = WhatsAppSender::with_api_base(
            reqwest::Client::new(),
            TwilioSettings::default(),
            "http://127.0.0.1:9",
        );
        let msg = OutboundMessage {
            text: "hi".to_string(),
            subject: String::new(),
            html: String::new(),
        };
        let report = sender.send(&msg).await;
        assert!(!report.success);
        assert!(report.details.is_empty());
        assert!(report.message.contains("notifications.twilio.account_sid"));
    }
}

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    WhatsApp,
    Email,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::WhatsApp => "whatsapp",
            Channel::Email => "email",
        }
    }
}

/// Outcome for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientResult {
    pub recipient: String,
    pub success: bool,
    /// Provider message id, when the provider returns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipientResult {
    pub fn sent(recipient: impl Into<String>, sid: Option<String>) -> Self {
        Self {
            recipient: recipient.into(),
            success: true,
            sid,
            error: None,
        }
    }

    pub fn failed(recipient: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            success: false,
            sid: None,
            error: Some(error.into()),
        }
    }
}

/// Result of one send attempt on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub channel: Channel,
    pub success: bool,
    pub message: String,
    pub details: Vec<RecipientResult>,
}

impl DeliveryReport {
    /// Nothing was sent because settings are incomplete.
    pub fn missing_settings(channel: Channel, missing: &[&str]) -> Self {
        Self {
            channel,
            success: false,
            message: format!(
                "Cannot send notification. Missing settings: {}.",
                missing.join(", ")
            ),
            details: Vec::new(),
        }
    }

    pub fn failed(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Summarize per-recipient results.
    pub fn from_results(channel: Channel, details: Vec<RecipientResult>) -> Self {
        let success = !details.is_empty() && details.iter().all(|r| r.success);
        let message = if success {
            format!("Successfully sent notifications to all {} recipient(s).", details.len())
        } else {
            "Finished sending notifications with one or more errors.".to_string()
        };
        Self {
            channel,
            success,
            message,
            details,
        }
    }
}

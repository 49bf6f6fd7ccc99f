use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::message::OutboundMessage;
use crate::report::DeliveryReport;
use crate::sender::NotificationSender;

/// Fans a new-case alert out to every configured channel.
#[derive(Clone, Default)]
pub struct Notifier {
    senders: Vec<Arc<dyn NotificationSender>>,
}

impl Notifier {
    pub fn new(senders: Vec<Arc<dyn NotificationSender>>) -> Self {
        Self { senders }
    }

    /// A notifier with no channels. Dispatch is a no-op.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_sender(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.senders.push(sender);
        self
    }

    /// Send on every channel concurrently and wait for all reports.
    pub async fn send_all(&self, message: &OutboundMessage) -> Vec<DeliveryReport> {
        let mut reports = Vec::with_capacity(self.senders.len());
        for handle in self.spawn_all(message) {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "notification task aborted"),
            }
        }
        reports
    }

    /// Fire-and-forget: spawn one task per channel and only log the outcome.
    pub fn dispatch(&self, message: OutboundMessage) {
        drop(self.spawn_all(&message));
    }

    fn spawn_all(&self, message: &OutboundMessage) -> Vec<JoinHandle<DeliveryReport>> {
        self.senders
            .iter()
            .map(|sender| {
                let sender = Arc::clone(sender);
                let message = message.clone();
                tokio::spawn(async move {
                    let report = sender.send(&message).await;
                    log_report(&report);
                    report
                })
            })
            .collect()
    }
}

fn log_report(report: &DeliveryReport) {
    let channel = report.channel.as_str();
    if report.success {
        info!(channel, recipients = report.details.len(), "notification delivered");
    } else {
        warn!(channel, message = %report.message, "notification not delivered");
    }
    for detail in report.details.iter().filter(|d| !d.success) {
        warn!(
            channel,
            recipient = %detail.recipient,
            error = detail.error.as_deref().unwrap_or(""),
            "recipient delivery failed"
        );
    }
}

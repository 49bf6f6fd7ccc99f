use crate::message::OutboundMessage;
use crate::report::{Channel, DeliveryReport};

/// An outbound alert channel.
///
/// Implementations report every failure inside the [`DeliveryReport`]; they
/// never return an error to the caller.
#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(&self, message: &OutboundMessage) -> DeliveryReport;
}

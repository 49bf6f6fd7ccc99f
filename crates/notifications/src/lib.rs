//! `dentlab-notifications`: the in-app inbox and outbound new-case alerts.
//!
//! Outbound delivery is best-effort: senders always return a
//! [`DeliveryReport`] and never fail the caller's write path.

pub mod email;
pub mod inbox;
pub mod message;
pub mod notifier;
pub mod report;
pub mod sender;
pub mod whatsapp;

pub use email::{EmailSender, SendGridSettings};
pub use inbox::Notification;
pub use message::OutboundMessage;
pub use notifier::Notifier;
pub use report::{Channel, DeliveryReport, RecipientResult};
pub use sender::NotificationSender;
pub use whatsapp::{TwilioSettings, WhatsAppSender};

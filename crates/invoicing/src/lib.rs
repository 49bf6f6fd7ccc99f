//! Invoicing domain module.
//!
//! Aggregates a doctor's cases over a date range into per-material unit
//! counts and totals, and freezes the result as an immutable invoice
//! snapshot. Pure domain logic (no IO, no HTTP, no storage).

pub mod aggregate;
pub mod invoice;
pub mod period;
pub mod price;

pub use aggregate::{InvoiceDraft, InvoiceRequest, compute_invoice};
pub use invoice::{Invoice, InvoiceSummaryItem};
pub use period::InvoicePeriod;
pub use price::PriceTable;

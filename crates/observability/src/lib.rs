//! Tracing and request logging (shared setup).

/// Initialize process-wide tracing with the default `info` filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info");
}

/// Request log records.
pub mod request;

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use request::{RequestLog, Severity};

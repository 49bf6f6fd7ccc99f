use std::time::Duration;

/// One served HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLog<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub status: u16,
    pub latency: Duration,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// 5xx are errors, 4xx warnings, everything else info.
    pub fn for_status(status: u16) -> Self {
        match status {
            500.. => Severity::Error,
            400..=499 => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl RequestLog<'_> {
    pub fn severity(&self) -> Severity {
        Severity::for_status(self.status)
    }

    pub fn record(&self) {
        let latency_ms = self.latency.as_secs_f64() * 1000.0;
        match self.severity() {
            Severity::Error => ::tracing::error!(
                method = self.method,
                path = self.path,
                status = self.status,
                latency_ms,
                "request failed"
            ),
            Severity::Warn => ::tracing::warn!(
                method = self.method,
                path = self.path,
                status = self.status,
                latency_ms,
                "request rejected"
            ),
            Severity::Info => ::tracing::info!(
                method = self.method,
                path = self.path,
                status = self.status,
                latency_ms,
                "request served"
            ),
        }
    }
}

//! Pluggable service logging.
//!
//! Dispatch failures are reported through a [`LogAdapter`] so applications
//! can route diagnostics into their own logging setup. Services default to
//! [`TracingLogger`]; installing `None` swaps in [`NoopLogger`], which
//! silences dispatch logging entirely.

use std::fmt::Write as _;

/// Sink for service-level log events.
pub trait LogAdapter: Send + Sync {
    /// Records an informational event with key/value context.
    fn info(&self, message: &str, keyvals: &[(&str, &str)]);

    /// Records an error event with key/value context.
    fn error(&self, message: &str, keyvals: &[(&str, &str)]);
}

/// Adapter that forwards events to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    service: String,
}

impl TracingLogger {
    /// Creates an adapter tagging every event with the service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl LogAdapter for TracingLogger {
    fn info(&self, message: &str, keyvals: &[(&str, &str)]) {
        let fields = format_keyvals(keyvals);
        tracing::info!(service.name = %self.service, fields = %fields, "{message}");
    }

    fn error(&self, message: &str, keyvals: &[(&str, &str)]) {
        let fields = format_keyvals(keyvals);
        tracing::error!(service.name = %self.service, fields = %fields, "{message}");
    }
}

/// Adapter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl LogAdapter for NoopLogger {
    fn info(&self, _message: &str, _keyvals: &[(&str, &str)]) {}

    fn error(&self, _message: &str, _keyvals: &[(&str, &str)]) {}
}

fn format_keyvals(keyvals: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (index, (key, value)) in keyvals.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{key}={value}");
    }
    out
}

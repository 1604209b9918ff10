//! Status reporting capability.
//!
//! The pipeline never logs through process-wide state. Each instance is
//! handed a [`StatusReporter`] at construction; without one it stays silent.
//! [`TracingReporter`] forwards reports to `tracing` under the
//! `backpressure` target.

use std::fmt;

/// Key/value context attached to a status report.
pub type Fields<'a> = &'a [(&'static str, String)];

/// Sink for leveled status messages.
pub trait StatusReporter: Send + Sync {
    fn info(&self, message: &str, fields: Fields<'_>);
    fn warn(&self, message: &str, fields: Fields<'_>);
    fn error(&self, message: &str, fields: Fields<'_>);
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn info(&self, message: &str, fields: Fields<'_>) {
        tracing::info!(target: "backpressure", fields = %FieldList(fields), "{message}");
    }

    fn warn(&self, message: &str, fields: Fields<'_>) {
        tracing::warn!(target: "backpressure", fields = %FieldList(fields), "{message}");
    }

    fn error(&self, message: &str, fields: Fields<'_>) {
        tracing::error!(target: "backpressure", fields = %FieldList(fields), "{message}");
    }
}

struct FieldList<'a>(Fields<'a>);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

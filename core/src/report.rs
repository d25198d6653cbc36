//! Out-of-band reporting of contained failures.
//!
//! Event handler failures never reach the publisher. They go here instead.

use crate::message::MessageKind;

/// Where a contained failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureContext {
    /// Message type being dispatched
    pub message_name: &'static str,
    /// Handler that failed
    pub handler_name: &'static str,
    /// Kind of the message
    pub kind: MessageKind,
}

/// Sink for failures that must not propagate to the caller.
pub trait FailureReporter: Send + Sync {
    /// Record a failure. Must not panic.
    fn report(&self, failure: &anyhow::Error, context: &FailureContext);
}

/// Reports failures as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &anyhow::Error, context: &FailureContext) {
        tracing::error!(
            message_type = context.message_name,
            handler = context.handler_name,
            kind = %context.kind,
            error = %failure,
            "Handler failed; failure contained"
        );
    }
}

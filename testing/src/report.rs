//! Failure reporter double.

use basniowa_core::report::{FailureContext, FailureReporter};
use std::sync::{Mutex, PoisonError};

/// A failure captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFailure {
    /// Where it happened
    pub context: FailureContext,
    /// Rendered error
    pub message: String,
}

/// Reporter that keeps every failure for later assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    failures: Mutex<Vec<ReportedFailure>>,
}

impl RecordingReporter {
    /// Create an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures reported so far, in order.
    #[must_use]
    pub fn failures(&self) -> Vec<ReportedFailure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the handlers that failed, in order.
    #[must_use]
    pub fn failed_handlers(&self) -> Vec<&'static str> {
        self.failures().iter().map(|f| f.context.handler_name).collect()
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, failure: &anyhow::Error, context: &FailureContext) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ReportedFailure {
                context: *context,
                message: failure.to_string(),
            });
    }
}

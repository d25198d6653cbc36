//! # Basniowa Testing
//!
//! Test doubles for the dispatch core.
//!
//! - [`handlers`]: recording command/event handlers with configurable outcomes
//! - [`sequence`]: scripted and gated sequence providers
//! - [`report`]: recording failure reporter
//!
//! ## Example
//!
//! ```
//! use basniowa_core::sequence::{IdBlock, SequenceProvider};
//! use basniowa_testing::ScriptedSequenceProvider;
//!
//! # tokio_test::block_on(async {
//! let provider = ScriptedSequenceProvider::new([Ok(IdBlock::new(1, 10))]);
//! assert_eq!(provider.reserve(10).await, Ok(IdBlock::new(1, 10)));
//! # });
//! ```

pub mod handlers;
pub mod report;
pub mod sequence;

pub use handlers::{
    CallLog, Outcome, Probe, RecordingCommandHandler, RecordingEventHandler, TestHandlerError,
};
pub use report::{RecordingReporter, ReportedFailure};
pub use sequence::{GatedSequenceProvider, ScriptedSequenceProvider};

/// Install a test-friendly tracing subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

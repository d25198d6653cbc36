//! Recording handler doubles.

use basniowa_core::handler::{CommandHandler, EventHandler, HandlerFuture};
use basniowa_core::message::{Command, Event};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Error raised by handlers configured with [`Outcome::Fail`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{handler} failed: {message}")]
pub struct TestHandlerError {
    /// Name of the failing handler
    pub handler: &'static str,
    /// Configured failure message
    pub message: String,
}

/// What a recording handler does when invoked.
#[derive(Debug, Clone, Default)]
pub enum Outcome {
    /// Return `Ok(())`
    #[default]
    Succeed,
    /// Return a [`TestHandlerError`] with this message
    Fail(String),
    /// Panic with this message
    Panic(String),
}

/// Shared, ordered record of handler invocations across several doubles.
#[derive(Debug, Default)]
pub struct CallLog {
    entries: Mutex<Vec<&'static str>>,
}

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append an entry.
    pub fn record(&self, entry: &'static str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Entries in invocation order.
    #[must_use]
    pub fn entries(&self) -> Vec<&'static str> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug)]
struct Recorder {
    name: &'static str,
    calls: AtomicUsize,
    outcome: Outcome,
    log: Option<Arc<CallLog>>,
}

impl Recorder {
    fn invoke(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.record(self.name);
        }
        match &self.outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Fail(message) => Err(TestHandlerError {
                handler: self.name,
                message: message.clone(),
            }
            .into()),
            #[allow(clippy::panic)] // the double exists to exercise panic containment
            Outcome::Panic(message) => panic!("{message}"),
        }
    }
}

/// Handle to inspect a recording double after it was moved into a container.
#[derive(Debug, Clone)]
pub struct Probe {
    recorder: Arc<Recorder>,
}

impl Probe {
    /// Number of times the handler ran.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.recorder.calls.load(Ordering::SeqCst)
    }
}

/// Command handler double counting invocations and producing a configured [`Outcome`].
pub struct RecordingCommandHandler<C> {
    recorder: Arc<Recorder>,
    _command: PhantomData<fn(C)>,
}

impl<C: Command> RecordingCommandHandler<C> {
    /// Handler that succeeds.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_outcome(name, Outcome::Succeed)
    }

    /// Handler that fails with a [`TestHandlerError`].
    #[must_use]
    pub fn failing(name: &'static str, message: &str) -> Self {
        Self::with_outcome(name, Outcome::Fail(message.to_string()))
    }

    /// Handler with an explicit outcome.
    #[must_use]
    pub fn with_outcome(name: &'static str, outcome: Outcome) -> Self {
        Self {
            recorder: Arc::new(Recorder {
                name,
                calls: AtomicUsize::new(0),
                outcome,
                log: None,
            }),
            _command: PhantomData,
        }
    }

    /// Also append to `log` on every invocation.
    #[must_use]
    pub fn logging_to(self, log: &Arc<CallLog>) -> Self {
        Self {
            recorder: Arc::new(Recorder {
                name: self.recorder.name,
                calls: AtomicUsize::new(self.recorder.calls.load(Ordering::SeqCst)),
                outcome: self.recorder.outcome.clone(),
                log: Some(Arc::clone(log)),
            }),
            _command: PhantomData,
        }
    }

    /// Probe for inspecting invocations.
    #[must_use]
    pub fn probe(&self) -> Probe {
        Probe {
            recorder: Arc::clone(&self.recorder),
        }
    }
}

impl<C: Command> CommandHandler<C> for RecordingCommandHandler<C> {
    fn handle<'a>(&'a self, _command: &'a mut C) -> HandlerFuture<'a> {
        Box::pin(async move { self.recorder.invoke() })
    }

    fn handler_name(&self) -> &'static str {
        self.recorder.name
    }
}

/// Event handler double counting invocations and producing a configured [`Outcome`].
pub struct RecordingEventHandler<E> {
    recorder: Arc<Recorder>,
    _event: PhantomData<fn(E)>,
}

impl<E: Event> RecordingEventHandler<E> {
    /// Handler that succeeds.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_outcome(name, Outcome::Succeed)
    }

    /// Handler that fails with a [`TestHandlerError`].
    #[must_use]
    pub fn failing(name: &'static str, message: &str) -> Self {
        Self::with_outcome(name, Outcome::Fail(message.to_string()))
    }

    /// Handler with an explicit outcome.
    #[must_use]
    pub fn with_outcome(name: &'static str, outcome: Outcome) -> Self {
        Self {
            recorder: Arc::new(Recorder {
                name,
                calls: AtomicUsize::new(0),
                outcome,
                log: None,
            }),
            _event: PhantomData,
        }
    }

    /// Also append to `log` on every invocation.
    #[must_use]
    pub fn logging_to(self, log: &Arc<CallLog>) -> Self {
        Self {
            recorder: Arc::new(Recorder {
                name: self.recorder.name,
                calls: AtomicUsize::new(self.recorder.calls.load(Ordering::SeqCst)),
                outcome: self.recorder.outcome.clone(),
                log: Some(Arc::clone(log)),
            }),
            _event: PhantomData,
        }
    }

    /// Probe for inspecting invocations.
    #[must_use]
    pub fn probe(&self) -> Probe {
        Probe {
            recorder: Arc::clone(&self.recorder),
        }
    }
}

impl<E: Event> EventHandler<E> for RecordingEventHandler<E> {
    fn handle<'a>(&'a self, _event: &'a E) -> HandlerFuture<'a> {
        Box::pin(async move { self.recorder.invoke() })
    }

    fn handler_name(&self) -> &'static str {
        self.recorder.name
    }
}

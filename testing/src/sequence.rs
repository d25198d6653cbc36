//! Sequence provider doubles.

use basniowa_core::error::SequenceError;
use basniowa_core::sequence::{IdBlock, ReserveFuture, SequenceProvider};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Semaphore;

/// Provider replaying a fixed script of reservation outcomes.
///
/// Once the script runs out every call fails with [`SequenceError::Unavailable`].
#[derive(Debug)]
pub struct ScriptedSequenceProvider {
    script: Mutex<VecDeque<Result<IdBlock, SequenceError>>>,
    calls: AtomicUsize,
}

impl ScriptedSequenceProvider {
    /// Provider answering with `outcomes` in order.
    #[must_use]
    pub fn new(outcomes: impl IntoIterator<Item = Result<IdBlock, SequenceError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `reserve` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SequenceProvider for ScriptedSequenceProvider {
    fn reserve(&self, _count: u64) -> ReserveFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(SequenceError::Unavailable("script exhausted".to_string())));
        Box::pin(async move { next })
    }
}

/// Counting provider whose reservations block until released by the test.
///
/// Lets a test pile up concurrent callers behind a single in-flight refill and then
/// observe how many reservations were actually issued.
#[derive(Debug)]
pub struct GatedSequenceProvider {
    next: AtomicI64,
    calls: AtomicUsize,
    gate: Semaphore,
    fail_next: Mutex<Option<SequenceError>>,
}

impl GatedSequenceProvider {
    /// Closed gate; blocks start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Let `reservations` pending or future reservations complete.
    pub fn release(&self, reservations: usize) {
        self.gate.add_permits(reservations);
    }

    /// Open the gate for good.
    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// Make the next released reservation fail with `error`.
    pub fn fail_next(&self, error: SequenceError) {
        *self.fail_next.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Number of `reserve` calls so far (including ones still waiting at the gate).
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for GatedSequenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceProvider for GatedSequenceProvider {
    fn reserve(&self, count: u64) -> ReserveFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| SequenceError::Unavailable(e.to_string()))?;
            permit.forget();

            if let Some(error) = self
                .fail_next
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            {
                return Err(error);
            }
            let width = i64::try_from(count).map_err(|_| SequenceError::InvalidCount)?;
            Ok(IdBlock::new(self.next.fetch_add(width, Ordering::SeqCst), count))
        })
    }
}

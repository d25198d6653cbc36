//! Buffered unique-identifier service.
//!
//! Reserves identifiers from a [`SequenceProvider`] in blocks and hands them out one at a
//! time, so that the provider is called roughly once per `block_size` identifiers.
//!
//! # Refill protocol
//!
//! ```text
//! next_id ──► lock ──► cursor < end? ──yes──► claim, unlock, return
//!                          │ no
//!                          ▼
//!              refill in flight? ──no──► start one (shared future), remember generation
//!                          │
//!                          ▼
//!                unlock, await shared refill
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼ Ok(block)             ▼ Err(e)
//!   first waiter installs it      clear refill, every waiter returns e
//!   loop back and claim
//! ```
//!
//! - Exactly one reservation is issued per exhaustion; everyone arriving meanwhile awaits it.
//! - A failed reservation is delivered to every waiter and leaves the old block exhausted,
//!   so the next call starts a fresh reservation. Nothing is skipped or reused.
//! - If every waiter is dropped mid-refill, the pending reservation stays registered and
//!   the next caller resumes it instead of issuing another one.
//! - The lock is never held across an `.await`.

use crate::config::IdServiceConfig;
use crate::metrics::IdServiceMetrics;
use basniowa_core::error::IdError;
use basniowa_core::sequence::{IdBlock, NextIdFuture, SequenceProvider, UniqueIdService};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::Instrument;

type RefillFuture = Shared<BoxFuture<'static, Result<IdBlock, IdError>>>;

#[derive(Debug, Clone, Copy)]
struct Cursor {
    block: IdBlock,
    next: i64,
}

struct PendingRefill {
    generation: u64,
    future: RefillFuture,
}

#[derive(Default)]
struct State {
    current: Option<Cursor>,
    refill: Option<PendingRefill>,
    generation: u64,
    /// Exclusive end of the most recently installed block
    high_water: Option<i64>,
}

impl State {
    fn claim(&mut self) -> Option<i64> {
        let cursor = self.current.as_mut()?;
        if cursor.next < cursor.block.end() {
            let id = cursor.next;
            cursor.next += 1;
            Some(id)
        } else {
            None
        }
    }

    fn remaining(&self) -> u64 {
        self.current
            .map_or(0, |c| u64::try_from(c.block.end() - c.next).unwrap_or(0))
    }

    fn complete(
        &mut self,
        generation: u64,
        outcome: Result<IdBlock, IdError>,
    ) -> Result<(), IdError> {
        let is_pending = self
            .refill
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);

        if is_pending {
            self.refill = None;
            if let Ok(block) = &outcome {
                tracing::debug!(
                    start = block.start,
                    count = block.count,
                    "Installed identifier block"
                );
                self.current = Some(Cursor {
                    block: *block,
                    next: block.start,
                });
                self.high_water = Some(block.end());
            }
        }

        outcome.map(|_| ())
    }
}

/// Identifier service that buffers blocks from a [`SequenceProvider`].
///
/// # Example
///
/// ```
/// use basniowa_core::sequence::UniqueIdService;
/// use basniowa_runtime::id_service::BufferedIdService;
/// use basniowa_runtime::sequence::InMemorySequenceProvider;
///
/// # tokio_test::block_on(async {
/// let ids = BufferedIdService::new(InMemorySequenceProvider::new(), 10);
/// assert_eq!(ids.next_id().await, Ok(1));
/// assert_eq!(ids.next_id().await, Ok(2));
/// # });
/// ```
pub struct BufferedIdService<P> {
    provider: Arc<P>,
    block_size: u64,
    state: Mutex<State>,
}

impl<P: SequenceProvider + 'static> BufferedIdService<P> {
    /// Create a service reserving `block_size` identifiers per refill (at least one).
    #[must_use]
    pub fn new(provider: P, block_size: u64) -> Self {
        Self::with_shared_provider(Arc::new(provider), block_size)
    }

    /// Create a service over a provider shared with other components.
    #[must_use]
    pub fn with_shared_provider(provider: Arc<P>, block_size: u64) -> Self {
        Self {
            provider,
            block_size: block_size.max(1),
            state: Mutex::new(State::default()),
        }
    }

    /// Create a service from configuration.
    #[must_use]
    pub fn from_config(provider: P, config: &IdServiceConfig) -> Self {
        Self::new(provider, config.block_size)
    }

    /// Identifiers reserved per refill.
    #[must_use]
    pub const fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Identifiers left in the current block.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.lock().remaining()
    }

    /// Claim the next identifier, refilling the block if it is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if a refill was needed and failed, or the provider returned an
    /// unusable block. The service stays consistent; a later call retries the refill.
    pub async fn next_id(&self) -> Result<i64, IdError> {
        loop {
            let (generation, refill) = {
                let mut state = self.lock();
                if let Some(id) = state.claim() {
                    IdServiceMetrics::record_issued();
                    return Ok(id);
                }
                let in_flight = state
                    .refill
                    .as_ref()
                    .map(|pending| (pending.generation, pending.future.clone()));
                match in_flight {
                    Some(joined) => joined,
                    None => {
                        state.generation += 1;
                        let generation = state.generation;
                        let future = self.start_refill(generation, state.high_water);
                        state.refill = Some(PendingRefill {
                            generation,
                            future: future.clone(),
                        });
                        (generation, future)
                    }
                }
            };

            let outcome = refill.await;
            self.lock().complete(generation, outcome)?;
        }
    }

    fn start_refill(&self, generation: u64, high_water: Option<i64>) -> RefillFuture {
        let provider = Arc::clone(&self.provider);
        let block_size = self.block_size;
        let span = tracing::debug_span!("id_block_refill", generation, block_size);

        async move {
            let started = Instant::now();
            let block = provider.reserve(block_size).await.map_err(|e| {
                tracing::warn!(error = %e, "Identifier block reservation failed");
                IdServiceMetrics::record_refill_failure();
                IdError::from(e)
            })?;
            IdServiceMetrics::record_refill(started.elapsed());

            if block.is_empty() {
                IdServiceMetrics::record_refill_failure();
                return Err(IdError::EmptyBlock);
            }
            if block.checked_end().is_none() {
                tracing::error!(
                    start = block.start,
                    count = block.count,
                    "Sequence provider returned block past i64::MAX"
                );
                IdServiceMetrics::record_refill_failure();
                return Err(IdError::BlockOutOfRange {
                    start: block.start,
                    count: block.count,
                });
            }
            if let Some(previous_end) = high_water {
                if block.start < previous_end {
                    tracing::error!(
                        previous_end,
                        start = block.start,
                        "Sequence provider returned overlapping block"
                    );
                    IdServiceMetrics::record_refill_failure();
                    return Err(IdError::NonMonotonicBlock {
                        previous_end,
                        start: block.start,
                    });
                }
            }
            Ok(block)
        }
        .instrument(span)
        .boxed()
        .shared()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is only mutated through complete transitions, so a poisoned guard is still valid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: SequenceProvider + 'static> UniqueIdService for BufferedIdService<P> {
    fn next_id(&self) -> NextIdFuture<'_> {
        Box::pin(Self::next_id(self))
    }
}

impl<P> std::fmt::Debug for BufferedIdService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedIdService")
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::InMemorySequenceProvider;
    use basniowa_core::error::SequenceError;
    use basniowa_core::sequence::ReserveFuture;

    struct Fixed(IdBlock);

    impl SequenceProvider for Fixed {
        fn reserve(&self, _count: u64) -> ReserveFuture<'_> {
            let block = self.0;
            Box::pin(async move { Ok(block) })
        }
    }

    #[tokio::test]
    async fn serves_block_then_refills() {
        let ids = BufferedIdService::new(InMemorySequenceProvider::new(), 3);
        let mut got = Vec::new();
        for _ in 0..7 {
            got.push(ids.next_id().await);
        }
        assert_eq!(got, (1..=7).map(Ok).collect::<Vec<_>>());
        assert_eq!(ids.remaining(), 2);
    }

    #[tokio::test]
    async fn zero_block_size_is_clamped() {
        let ids = BufferedIdService::new(InMemorySequenceProvider::new(), 0);
        assert_eq!(ids.block_size(), 1);
        assert_eq!(ids.next_id().await, Ok(1));
        assert_eq!(ids.next_id().await, Ok(2));
    }

    #[tokio::test]
    async fn empty_block_is_rejected() {
        let ids = BufferedIdService::new(Fixed(IdBlock::new(1, 0)), 10);
        assert_eq!(ids.next_id().await, Err(IdError::EmptyBlock));
        assert_eq!(ids.remaining(), 0);
    }

    #[tokio::test]
    async fn overlapping_block_is_rejected() {
        let ids = BufferedIdService::new(Fixed(IdBlock::new(1, 2)), 2);
        assert_eq!(ids.next_id().await, Ok(1));
        assert_eq!(ids.next_id().await, Ok(2));
        assert_eq!(
            ids.next_id().await,
            Err(IdError::NonMonotonicBlock {
                previous_end: 3,
                start: 1
            })
        );
    }

    #[tokio::test]
    async fn block_past_i64_max_is_rejected() {
        let ids = BufferedIdService::new(Fixed(IdBlock::new(i64::MAX - 2, 10)), 10);
        assert_eq!(
            ids.next_id().await,
            Err(IdError::BlockOutOfRange {
                start: i64::MAX - 2,
                count: 10
            })
        );
        assert_eq!(ids.remaining(), 0);
    }

    #[tokio::test]
    async fn block_ending_at_i64_max_is_served() {
        let ids = BufferedIdService::new(Fixed(IdBlock::new(i64::MAX - 2, 2)), 2);
        assert_eq!(ids.next_id().await, Ok(i64::MAX - 2));
        assert_eq!(ids.next_id().await, Ok(i64::MAX - 1));
        assert_eq!(ids.remaining(), 0);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_sequence_error() {
        struct Refusing;
        impl SequenceProvider for Refusing {
            fn reserve(&self, _count: u64) -> ReserveFuture<'_> {
                Box::pin(async { Err(SequenceError::Unavailable("maintenance".into())) })
            }
        }

        let ids = BufferedIdService::new(Refusing, 10);
        assert_eq!(
            ids.next_id().await,
            Err(IdError::Sequence(SequenceError::Unavailable("maintenance".into())))
        );
    }
}

//! In-process sequence provider.

use basniowa_core::error::SequenceError;
use basniowa_core::sequence::{IdBlock, ReserveFuture, SequenceProvider};
use std::sync::atomic::{AtomicI64, Ordering};

/// Sequence provider backed by an atomic counter.
///
/// Blocks never overlap within one process. Suitable for tests and single-instance
/// deployments; use a database-backed provider when several processes allocate ids.
#[derive(Debug)]
pub struct InMemorySequenceProvider {
    next: AtomicI64,
}

impl InMemorySequenceProvider {
    /// Provider whose first block starts at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Provider whose first block starts at `first`.
    #[must_use]
    pub const fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    /// First identifier of the next block to be reserved.
    #[must_use]
    pub fn peek_next(&self) -> i64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for InMemorySequenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceProvider for InMemorySequenceProvider {
    fn reserve(&self, count: u64) -> ReserveFuture<'_> {
        Box::pin(async move {
            if count == 0 {
                return Err(SequenceError::InvalidCount);
            }
            let width = i64::try_from(count)
                .map_err(|_| SequenceError::Database(format!("block size {count} out of range")))?;
            let start = self.next.fetch_add(width, Ordering::SeqCst);
            Ok(IdBlock::new(start, count))
        })
    }
}

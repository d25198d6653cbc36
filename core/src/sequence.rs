//! Identifier blocks, the sequence-provider capability and the unique-id service contract.

use crate::error::{IdError, SequenceError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A contiguous half-open range `[start, start + count)` of reserved identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdBlock {
    /// First identifier in the block
    pub start: i64,
    /// Number of identifiers in the block
    pub count: u64,
}

impl IdBlock {
    /// Create a block.
    #[must_use]
    pub const fn new(start: i64, count: u64) -> Self {
        Self { start, count }
    }

    /// Exclusive end of the block, saturating at `i64::MAX`.
    #[must_use]
    pub const fn end(&self) -> i64 {
        self.start.saturating_add_unsigned(self.count)
    }

    /// Exclusive end of the block, or `None` if it lies beyond `i64::MAX`.
    #[must_use]
    pub const fn checked_end(&self) -> Option<i64> {
        self.start.checked_add_unsigned(self.count)
    }

    /// Whether `id` falls inside the block.
    #[must_use]
    pub const fn contains(&self, id: i64) -> bool {
        id >= self.start && id < self.end()
    }

    /// Whether the block holds no identifiers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Boxed future returned by [`SequenceProvider::reserve`].
pub type ReserveFuture<'a> =
    Pin<Box<dyn Future<Output = Result<IdBlock, SequenceError>> + Send + 'a>>;

/// Boxed future returned by [`UniqueIdService::next_id`].
pub type NextIdFuture<'a> = Pin<Box<dyn Future<Output = Result<i64, IdError>> + Send + 'a>>;

/// External source of non-overlapping identifier blocks.
///
/// Implementations must guarantee that no two reservations, concurrent or from different
/// processes, ever return overlapping ranges.
pub trait SequenceProvider: Send + Sync {
    /// Atomically reserve `count` consecutive identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError`] if the backing store fails or `count` is zero.
    fn reserve(&self, count: u64) -> ReserveFuture<'_>;
}

impl<P: SequenceProvider + ?Sized> SequenceProvider for Arc<P> {
    fn reserve(&self, count: u64) -> ReserveFuture<'_> {
        (**self).reserve(count)
    }
}

/// Hands out globally unique identifiers.
pub trait UniqueIdService: Send + Sync {
    /// Next identifier. Strictly greater than any previously returned by this instance.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if a new block was needed and could not be obtained.
    fn next_id(&self) -> NextIdFuture<'_>;
}

impl<S: UniqueIdService + ?Sized> UniqueIdService for Arc<S> {
    fn next_id(&self) -> NextIdFuture<'_> {
        (**self).next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn block_bounds_are_half_open() {
        let block = IdBlock::new(11, 10);
        assert_eq!(block.end(), 21);
        assert!(block.contains(11));
        assert!(block.contains(20));
        assert!(!block.contains(21));
        assert!(!block.contains(10));
    }

    #[test]
    fn empty_block() {
        let block = IdBlock::new(5, 0);
        assert!(block.is_empty());
        assert!(!block.contains(5));
    }

    #[test]
    fn end_past_i64_max_is_detected() {
        let block = IdBlock::new(i64::MAX - 2, 10);
        assert_eq!(block.checked_end(), None);
        assert_eq!(block.end(), i64::MAX);

        let last = IdBlock::new(i64::MAX - 2, 2);
        assert_eq!(last.checked_end(), Some(i64::MAX));
    }

    proptest! {
        /// `contains` agrees with the half-open range and `end` advances by `count`.
        #[test]
        fn contains_matches_range(
            start in -1_000_000i64..1_000_000,
            count in 0u64..10_000,
            probe in -1_000_000i64..1_010_000,
        ) {
            let block = IdBlock::new(start, count);
            prop_assert_eq!(block.end() - block.start, i64::try_from(count).unwrap_or(i64::MAX));
            prop_assert_eq!(block.contains(probe), (start..block.end()).contains(&probe));
        }
    }
}

//! Error taxonomy for dispatch and identifier allocation.
//!
//! Three families of failure exist and they must not be collapsed into one:
//!
//! - **Configuration** ([`DispatchError::NoHandler`], [`DispatchError::AmbiguousHandler`]):
//!   a registration defect. Always surfaces to the sender, never retried.
//! - **Handler execution** ([`DispatchError::Handler`]): whatever the handler returned.
//!   Surfaces unchanged for commands; contained and reported for events.
//! - **Dependency** ([`SequenceError`], wrapped in [`IdError`]): the sequence source
//!   failed. Surfaces to every caller waiting on the failed refill.

use thiserror::Error;

/// Errors returned by [`CommandSender::send`](crate::bus::CommandSender::send) and
/// [`EventPublisher::publish`](crate::bus::EventPublisher::publish).
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No handler is registered for the command type.
    #[error("No handler registered for command {command}")]
    NoHandler {
        /// Name of the command type
        command: &'static str,
    },

    /// More than one handler is registered for the command type.
    #[error("Ambiguous routing for command {command}: {count} handlers registered, expected exactly one")]
    AmbiguousHandler {
        /// Name of the command type
        command: &'static str,
        /// Number of handlers found
        count: usize,
    },

    /// The resolver could not produce handlers for the message type.
    #[error("Handler resolution failed for {message}: {reason}")]
    Resolution {
        /// Name of the message type
        message: &'static str,
        /// Why resolution failed
        reason: String,
    },

    /// The bus could not begin dispatching (e.g. no runtime to run handlers on).
    #[error("Dispatch unavailable: {0}")]
    Unavailable(String),

    /// The command handler failed. The inner error is exactly what the handler returned.
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl DispatchError {
    /// Whether this error indicates a missing or ambiguous registration.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NoHandler { .. } | Self::AmbiguousHandler { .. })
    }

    /// The error raised by the command handler, if that is what failed.
    #[must_use]
    pub const fn handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }

    /// Downcast the handler error to a concrete domain error type.
    ///
    /// Returns `None` for non-handler failures or when the handler raised another type.
    #[must_use]
    pub fn downcast_handler_error<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        self.handler_error().and_then(anyhow::Error::downcast_ref::<E>)
    }
}

/// Errors raised by a [`SequenceProvider`](crate::sequence::SequenceProvider).
///
/// Clonable so that a single failed reservation can be delivered to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The backing store could not be reached
    #[error("Sequence source unavailable: {0}")]
    Unavailable(String),

    /// The backing store rejected the reservation
    #[error("Sequence database error: {0}")]
    Database(String),

    /// A reservation of zero identifiers was requested
    #[error("Cannot reserve an empty block")]
    InvalidCount,
}

/// Errors returned by [`UniqueIdService::next_id`](crate::sequence::UniqueIdService::next_id).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The sequence provider failed while refilling the block.
    #[error("Identifier block refill failed: {0}")]
    Sequence(#[from] SequenceError),

    /// The sequence provider returned a block with no identifiers.
    #[error("Sequence provider returned an empty block")]
    EmptyBlock,

    /// The sequence provider returned a block extending past the largest identifier.
    #[error("Sequence provider returned block of {count} starting at {start}, which overflows i64")]
    BlockOutOfRange {
        /// Start of the rejected block
        start: i64,
        /// Size of the rejected block
        count: u64,
    },

    /// The sequence provider returned a block overlapping identifiers already handed out.
    #[error("Sequence provider returned block starting at {start}, previous block ended at {previous_end}")]
    NonMonotonicBlock {
        /// Exclusive end of the previous block
        previous_end: i64,
        /// Start of the rejected block
        start: i64,
    },
}

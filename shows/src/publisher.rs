//! Late-bound event publisher.
//!
//! Command handlers are registered before the bus that will resolve them exists, yet they
//! need that bus to publish events. [`DeferredPublisher`] is handed to the handlers at
//! registration time and bound to the bus once it is built.

use basniowa_core::bus::{DispatchFuture, EventPublisher};
use basniowa_core::error::DispatchError;
use basniowa_core::message::Event;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Publisher that forwards to a target bound after construction.
///
/// Publishing before [`bind`](Self::bind) fails with [`DispatchError::Unavailable`].
pub struct DeferredPublisher<B> {
    target: Arc<OnceLock<B>>,
}

impl<B> DeferredPublisher<B> {
    /// Create an unbound publisher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: Arc::new(OnceLock::new()),
        }
    }

    /// Bind the target. Returns `false` (and keeps the first target) if already bound.
    pub fn bind(&self, target: B) -> bool {
        let bound = self.target.set(target).is_ok();
        if !bound {
            tracing::warn!("Deferred publisher already bound; keeping the first target");
        }
        bound
    }

    /// Whether a target has been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }
}

impl<B> Default for DeferredPublisher<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for DeferredPublisher<B> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
        }
    }
}

impl<B> fmt::Debug for DeferredPublisher<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredPublisher")
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<B, E> EventPublisher<E> for DeferredPublisher<B>
where
    B: EventPublisher<E>,
    E: Event,
{
    fn publish(&self, event: E) -> DispatchFuture<'_> {
        match self.target.get() {
            Some(target) => target.publish(event),
            None => Box::pin(async {
                Err(DispatchError::Unavailable(
                    "event publisher is not bound to a bus yet".to_string(),
                ))
            }),
        }
    }
}

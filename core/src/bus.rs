//! Sender and publisher contracts.
//!
//! The two operations deliberately have different failure semantics:
//!
//! ```text
//!                   resolution    cardinality     handler failure
//! send(command)     surfaces      0 or >1 = err   surfaces unchanged
//! publish(event)    surfaces      any is fine     reported, never surfaces
//! ```
//!
//! Both return boxed futures so that an implementation is free to run handlers inline or
//! hand them to a worker without changing the contract.

use crate::error::DispatchError;
use crate::message::{Command, Event};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by dispatch operations.
pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + 'a>>;

/// Sends commands to their single handler.
pub trait CommandSender<C: Command>: Send + Sync {
    /// Send `command` to its handler and wait for the handler to finish.
    ///
    /// The handler may write results back into `command`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NoHandler`] / [`DispatchError::AmbiguousHandler`] if the binding is
    ///   not exactly one handler; no handler runs in that case.
    /// - [`DispatchError::Resolution`] if handlers could not be resolved.
    /// - [`DispatchError::Handler`] carrying the handler's own error, unchanged.
    fn send<'a>(&'a self, command: &'a mut C) -> DispatchFuture<'a>;
}

/// Publishes events to every registered handler.
pub trait EventPublisher<E: Event>: Send + Sync {
    /// Publish `event`.
    ///
    /// When the returned future resolves, the event has been registered for dispatch;
    /// handlers may already have finished or may finish later.
    ///
    /// # Errors
    ///
    /// Only failures before any handler starts: [`DispatchError::Resolution`] or
    /// [`DispatchError::Unavailable`]. Handler failures are reported out-of-band.
    fn publish(&self, event: E) -> DispatchFuture<'_>;
}

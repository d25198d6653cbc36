//! In-process message bus.
//!
//! [`MessageBus`] implements both [`CommandSender`] and [`EventPublisher`] on top of a
//! [`HandlerResolver`]. It holds no mutable state: cloning it is cheap and handlers may keep
//! a clone to send further commands or publish further events while they run.
//!
//! # Failure policy
//!
//! - Commands: zero or several handlers is a configuration error and no handler runs.
//!   A handler failure is returned to the sender unchanged.
//! - Events: any number of handlers is fine. Each handler runs regardless of earlier
//!   failures; failures (including panics) go to the [`FailureReporter`] only.
//! - Both: failures before any handler starts (resolution, no runtime) are returned.

use crate::config::{DispatchConfig, EventDispatchMode};
use crate::metrics::DispatchMetrics;
use basniowa_core::bus::{CommandSender, DispatchFuture, EventPublisher};
use basniowa_core::error::DispatchError;
use basniowa_core::handler::EventHandler;
use basniowa_core::message::{Command, Event, MessageKind};
use basniowa_core::report::{FailureContext, FailureReporter, TracingReporter};
use basniowa_core::resolver::HandlerResolver;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::Instrument;

struct Inner<R> {
    resolver: R,
    reporter: Arc<dyn FailureReporter>,
    mode: EventDispatchMode,
}

/// Command sender and event publisher.
///
/// # Example
///
/// ```
/// use basniowa_core::command;
/// use basniowa_core::handler::{CommandHandler, HandlerFuture};
/// use basniowa_core::provider::ServiceCollection;
/// use basniowa_core::resolver::ProviderHandlerResolver;
/// use basniowa_runtime::bus::MessageBus;
///
/// #[derive(Debug, Default)]
/// struct AddShow {
///     show_id: i64,
/// }
/// command!(AddShow);
///
/// struct AddShowHandler;
///
/// impl CommandHandler<AddShow> for AddShowHandler {
///     fn handle<'a>(&'a self, command: &'a mut AddShow) -> HandlerFuture<'a> {
///         Box::pin(async move {
///             command.show_id = 7;
///             Ok(())
///         })
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let bus = MessageBus::new(ProviderHandlerResolver::new(
///     ServiceCollection::new()
///         .with_command_handler::<AddShow, _>(AddShowHandler)
///         .build(),
/// ));
///
/// let mut command = AddShow::default();
/// assert!(bus.send_command(&mut command).await.is_ok());
/// assert_eq!(command.show_id, 7);
/// # });
/// ```
pub struct MessageBus<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for MessageBus<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for MessageBus<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("mode", &self.inner.mode)
            .finish_non_exhaustive()
    }
}

impl<R: HandlerResolver> MessageBus<R> {
    /// Bus running event handlers inline and reporting failures through `tracing`.
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self::builder(resolver).build()
    }

    /// Start configuring a bus.
    #[must_use]
    pub fn builder(resolver: R) -> MessageBusBuilder<R> {
        MessageBusBuilder {
            resolver,
            reporter: Arc::new(TracingReporter),
            mode: EventDispatchMode::default(),
        }
    }

    /// The resolver this bus dispatches through.
    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.inner.resolver
    }

    /// Event handler execution mode.
    #[must_use]
    pub fn event_dispatch_mode(&self) -> EventDispatchMode {
        self.inner.mode
    }

    /// Send a command to its single handler.
    ///
    /// # Errors
    ///
    /// See [`CommandSender::send`].
    #[tracing::instrument(skip_all, name = "send_command", fields(command = C::message_name()))]
    pub async fn send_command<C: Command>(&self, command: &mut C) -> Result<(), DispatchError> {
        let name = C::message_name();
        let mut handlers = self.inner.resolver.command_handlers::<C>()?;

        if handlers.len() > 1 {
            tracing::warn!(count = handlers.len(), "Ambiguous command routing");
            DispatchMetrics::record_configuration_error(name);
            return Err(DispatchError::AmbiguousHandler {
                command: name,
                count: handlers.len(),
            });
        }
        let Some(handler) = handlers.pop() else {
            tracing::warn!("No handler registered for command");
            DispatchMetrics::record_configuration_error(name);
            return Err(DispatchError::NoHandler { command: name });
        };

        tracing::debug!(handler = handler.handler_name(), "Dispatching command");
        let started = Instant::now();
        match handler.handle(command).await {
            Ok(()) => {
                DispatchMetrics::record_command(name, started.elapsed());
                Ok(())
            }
            Err(err) => {
                tracing::debug!(error = %err, "Command handler failed");
                DispatchMetrics::record_command_failure(name);
                Err(DispatchError::Handler(err))
            }
        }
    }

    /// Publish an event to every registered handler.
    ///
    /// # Errors
    ///
    /// See [`EventPublisher::publish`].
    #[tracing::instrument(skip_all, name = "publish_event", fields(event = E::message_name()))]
    pub async fn publish_event<E: Event>(&self, event: E) -> Result<(), DispatchError> {
        let handlers = self.inner.resolver.event_handlers::<E>()?;
        DispatchMetrics::record_event(E::message_name());

        if handlers.is_empty() {
            tracing::debug!("No handlers registered for event");
            return Ok(());
        }

        match self.inner.mode {
            EventDispatchMode::Inline => {
                run_event_handlers(&event, &handlers, self.inner.reporter.as_ref()).await;
            }
            EventDispatchMode::Background => {
                let runtime = tokio::runtime::Handle::try_current()
                    .map_err(|e| DispatchError::Unavailable(e.to_string()))?;
                let reporter = Arc::clone(&self.inner.reporter);
                tracing::trace!(count = handlers.len(), "Queued event handlers");
                runtime.spawn(
                    async move {
                        run_event_handlers(&event, &handlers, reporter.as_ref()).await;
                    }
                    .in_current_span(),
                );
            }
        }
        Ok(())
    }
}

async fn run_event_handlers<E: Event>(
    event: &E,
    handlers: &[Arc<dyn EventHandler<E>>],
    reporter: &dyn FailureReporter,
) {
    for handler in handlers {
        let handler_name = handler.handler_name();
        tracing::debug!(handler = handler_name, "Dispatching event");

        let outcome = AssertUnwindSafe(async { handler.handle(event).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!("handler panicked: {}", panic_message(&*payload)))
            });

        if let Err(failure) = outcome {
            DispatchMetrics::record_event_handler_failure(E::message_name(), handler_name);
            reporter.report(
                &failure,
                &FailureContext {
                    message_name: E::message_name(),
                    handler_name,
                    kind: MessageKind::Event,
                },
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<R: HandlerResolver, C: Command> CommandSender<C> for MessageBus<R> {
    fn send<'a>(&'a self, command: &'a mut C) -> DispatchFuture<'a> {
        Box::pin(self.send_command(command))
    }
}

impl<R: HandlerResolver, E: Event> EventPublisher<E> for MessageBus<R> {
    fn publish(&self, event: E) -> DispatchFuture<'_> {
        Box::pin(self.publish_event(event))
    }
}

/// Non-owning handle to a [`MessageBus`], obtained from [`MessageBus::downgrade`].
///
/// Components owned by the bus's own handlers hold this instead of a [`MessageBus`] so that
/// the bus and its handlers do not keep each other alive. Dispatching through a handle whose
/// bus has been dropped fails with [`DispatchError::Unavailable`].
pub struct WeakMessageBus<R> {
    inner: Weak<Inner<R>>,
}

impl<R> MessageBus<R> {
    /// Create a handle that does not keep this bus alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakMessageBus<R> {
        WeakMessageBus {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<R> WeakMessageBus<R> {
    /// The bus, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<MessageBus<R>> {
        self.inner.upgrade().map(|inner| MessageBus { inner })
    }
}

impl<R> Clone for WeakMessageBus<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for WeakMessageBus<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMessageBus")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

fn bus_dropped() -> DispatchError {
    DispatchError::Unavailable("message bus has been dropped".to_string())
}

impl<R: HandlerResolver, C: Command> CommandSender<C> for WeakMessageBus<R> {
    fn send<'a>(&'a self, command: &'a mut C) -> DispatchFuture<'a> {
        let bus = self.upgrade();
        Box::pin(async move {
            match bus {
                Some(bus) => bus.send_command(command).await,
                None => Err(bus_dropped()),
            }
        })
    }
}

impl<R: HandlerResolver, E: Event> EventPublisher<E> for WeakMessageBus<R> {
    fn publish(&self, event: E) -> DispatchFuture<'_> {
        let bus = self.upgrade();
        Box::pin(async move {
            match bus {
                Some(bus) => bus.publish_event(event).await,
                None => Err(bus_dropped()),
            }
        })
    }
}

/// Builder for [`MessageBus`].
pub struct MessageBusBuilder<R> {
    resolver: R,
    reporter: Arc<dyn FailureReporter>,
    mode: EventDispatchMode,
}

impl<R: HandlerResolver> MessageBusBuilder<R> {
    /// Sink for contained event handler failures.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Event handler execution mode.
    #[must_use]
    pub fn event_dispatch_mode(mut self, mode: EventDispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Apply dispatch configuration.
    #[must_use]
    pub fn config(self, config: &DispatchConfig) -> Self {
        self.event_dispatch_mode(config.event_dispatch_mode)
    }

    /// Build the bus.
    #[must_use]
    pub fn build(self) -> MessageBus<R> {
        tracing::debug!(mode = %self.mode, "Message bus constructed");
        MessageBus {
            inner: Arc::new(Inner {
                resolver: self.resolver,
                reporter: self.reporter,
                mode: self.mode,
            }),
        }
    }
}

impl<R> fmt::Debug for MessageBusBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBusBuilder")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_extraction() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*literal), "boom");

        let owned: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(&*owned), "kaboom");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*other), "non-string panic payload");
    }
}

//! Handler resolution.
//!
//! A resolver maps a message type to the ordered handlers able to process it. It makes no
//! judgement about cardinality: an empty result is valid here, and deciding that a command
//! with zero or several handlers is a configuration error is the bus's job.

use crate::error::DispatchError;
use crate::handler::{CommandHandler, EventHandler};
use crate::message::{Command, Event, Message};
use crate::provider::{Instance, ObjectProvider, command_handler_key, event_handler_key};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps message types to handler instances.
///
/// Implementations must be read-only after construction and return the same ordering on
/// every call within a process run.
pub trait HandlerResolver: Send + Sync + 'static {
    /// Handlers registered for command type `C`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Resolution`] if the backing container cannot be queried.
    fn command_handlers<C: Command>(
        &self,
    ) -> Result<Vec<Arc<dyn CommandHandler<C>>>, DispatchError>;

    /// Handlers registered for event type `E`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Resolution`] if the backing container cannot be queried.
    fn event_handlers<E: Event>(&self) -> Result<Vec<Arc<dyn EventHandler<E>>>, DispatchError>;
}

impl<R: HandlerResolver> HandlerResolver for Arc<R> {
    fn command_handlers<C: Command>(
        &self,
    ) -> Result<Vec<Arc<dyn CommandHandler<C>>>, DispatchError> {
        (**self).command_handlers::<C>()
    }

    fn event_handlers<E: Event>(&self) -> Result<Vec<Arc<dyn EventHandler<E>>>, DispatchError> {
        (**self).event_handlers::<E>()
    }
}

/// Resolver backed by an [`ObjectProvider`].
///
/// The provider is queried once, in [`new`](Self::new), for every service type it reports.
/// Dispatch then reads that snapshot only, so registrations made on the provider afterwards
/// are never seen and resolution order is fixed for the lifetime of the resolver.
pub struct ProviderHandlerResolver<P> {
    provider: P,
    bindings: HashMap<TypeId, Vec<Instance>>,
}

impl<P: ObjectProvider> ProviderHandlerResolver<P> {
    /// Create a resolver, snapshotting every binding `provider` currently holds.
    #[must_use]
    pub fn new(provider: P) -> Self {
        let bindings: HashMap<_, _> = provider
            .registered_services()
            .into_iter()
            .map(|service| (service, provider.provide_instances_of(service)))
            .filter(|(_, instances)| !instances.is_empty())
            .collect();
        tracing::debug!(services = bindings.len(), "Handler bindings resolved");
        Self { provider, bindings }
    }

    /// The underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    fn resolve<M, H>(&self, key: TypeId) -> Result<Vec<Arc<H>>, DispatchError>
    where
        M: Message,
        H: ?Sized + Send + Sync + 'static,
    {
        let Some(instances) = self.bindings.get(&key) else {
            return Ok(Vec::new());
        };
        instances
            .iter()
            .map(|instance| {
                instance
                    .downcast_ref::<Arc<H>>()
                    .map(Arc::clone)
                    .ok_or_else(|| DispatchError::Resolution {
                        message: M::message_name(),
                        reason: "registered instance does not implement the handler trait"
                            .to_string(),
                    })
            })
            .collect()
    }
}

impl<P> fmt::Debug for ProviderHandlerResolver<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandlerResolver")
            .field("services", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

impl<P: ObjectProvider + 'static> HandlerResolver for ProviderHandlerResolver<P> {
    fn command_handlers<C: Command>(
        &self,
    ) -> Result<Vec<Arc<dyn CommandHandler<C>>>, DispatchError> {
        let handlers = self.resolve::<C, dyn CommandHandler<C>>(command_handler_key::<C>())?;
        tracing::trace!(
            command = C::message_name(),
            count = handlers.len(),
            "Resolved command handlers"
        );
        Ok(handlers)
    }

    fn event_handlers<E: Event>(&self) -> Result<Vec<Arc<dyn EventHandler<E>>>, DispatchError> {
        let handlers = self.resolve::<E, dyn EventHandler<E>>(event_handler_key::<E>())?;
        tracing::trace!(
            event = E::message_name(),
            count = handlers.len(),
            "Resolved event handlers"
        );
        Ok(handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerFuture;
    use crate::provider::ServiceCollection;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct AddShow;
    crate::command!(AddShow);

    #[derive(Debug)]
    struct ShowAdded;
    crate::event!(ShowAdded);

    struct AddShowHandler;

    impl CommandHandler<AddShow> for AddShowHandler {
        fn handle<'a>(&'a self, _command: &'a mut AddShow) -> HandlerFuture<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    struct First;
    struct Second;

    impl EventHandler<ShowAdded> for First {
        fn handle<'a>(&'a self, _event: &'a ShowAdded) -> HandlerFuture<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    impl EventHandler<ShowAdded> for Second {
        fn handle<'a>(&'a self, _event: &'a ShowAdded) -> HandlerFuture<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn resolves_in_registration_order() {
        let resolver = ProviderHandlerResolver::new(
            ServiceCollection::new()
                .with_event_handler::<ShowAdded, _>(First)
                .with_event_handler::<ShowAdded, _>(Second)
                .build(),
        );

        for _ in 0..3 {
            let names: Vec<_> = resolver
                .event_handlers::<ShowAdded>()
                .map(|hs| hs.iter().map(|h| h.handler_name()).collect())
                .unwrap_or_default();
            assert_eq!(names.len(), 2);
            assert!(names[0].ends_with("First"));
            assert!(names[1].ends_with("Second"));
        }
    }

    #[test]
    fn unregistered_type_resolves_to_empty() {
        let resolver = ProviderHandlerResolver::new(ServiceCollection::new().build());
        assert!(matches!(resolver.command_handlers::<AddShow>(), Ok(hs) if hs.is_empty()));
        assert!(matches!(resolver.event_handlers::<ShowAdded>(), Ok(hs) if hs.is_empty()));
    }

    #[test]
    fn command_handler_resolved() {
        let resolver = ProviderHandlerResolver::new(
            ServiceCollection::new()
                .with_command_handler::<AddShow, _>(AddShowHandler)
                .build(),
        );
        assert!(matches!(resolver.command_handlers::<AddShow>(), Ok(hs) if hs.len() == 1));
    }

    struct Mislabelled;

    impl ObjectProvider for Mislabelled {
        fn provide_instances_of(&self, _service: TypeId) -> Vec<Instance> {
            let instance: Instance = Arc::new("not a handler");
            vec![instance]
        }

        fn registered_services(&self) -> Vec<TypeId> {
            vec![command_handler_key::<AddShow>()]
        }
    }

    #[test]
    fn wrong_instance_type_is_a_resolution_error() {
        let resolver = ProviderHandlerResolver::new(Mislabelled);
        assert!(matches!(
            resolver.command_handlers::<AddShow>(),
            Err(DispatchError::Resolution { .. })
        ));
    }

    /// A container that keeps accepting registrations and counts lookups.
    #[derive(Default)]
    struct OpenContainer {
        events: Mutex<Vec<Instance>>,
        lookups: AtomicUsize,
    }

    impl OpenContainer {
        fn register(&self, handler: Arc<dyn EventHandler<ShowAdded>>) {
            let instance: Instance = Arc::new(handler);
            self.events
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(instance);
        }
    }

    impl ObjectProvider for OpenContainer {
        fn provide_instances_of(&self, service: TypeId) -> Vec<Instance> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if service == event_handler_key::<ShowAdded>() {
                self.events
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .clone()
            } else {
                Vec::new()
            }
        }

        fn registered_services(&self) -> Vec<TypeId> {
            vec![event_handler_key::<ShowAdded>()]
        }
    }

    #[test]
    fn provider_is_consulted_only_at_construction() {
        let container = Arc::new(OpenContainer::default());
        container.register(Arc::new(First));

        let resolver = ProviderHandlerResolver::new(Arc::clone(&container));
        let lookups_after_build = container.lookups.load(Ordering::SeqCst);

        container.register(Arc::new(Second));
        for _ in 0..3 {
            assert!(matches!(resolver.event_handlers::<ShowAdded>(), Ok(hs) if hs.len() == 1));
            assert!(matches!(resolver.command_handlers::<AddShow>(), Ok(hs) if hs.is_empty()));
        }

        assert_eq!(container.lookups.load(Ordering::SeqCst), lookups_after_build);
    }
}

//! Object-provider capability and a minimal container implementing it.
//!
//! The resolver only needs one thing from a container: "give me every instance registered
//! for this service type, in registration order". [`ObjectProvider`] is that capability.
//! [`ServiceCollection`] is the registration-time builder; [`ServiceCollection::build`]
//! freezes it into an immutable [`ServiceProvider`] that is safe to share across threads.
//!
//! Handlers are registered under the type id of their trait object
//! (`dyn CommandHandler<C>` / `dyn EventHandler<E>`), and stored as
//! `Arc<dyn CommandHandler<C>>` inside an `Arc<dyn Any>`.

use crate::handler::{CommandHandler, EventHandler};
use crate::message::{Command, Event};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Supplies instances registered for a service type.
pub trait ObjectProvider: Send + Sync {
    /// All instances registered for `service`, in registration order. Empty if none.
    fn provide_instances_of(&self, service: TypeId) -> Vec<Instance>;

    /// Every service type with at least one registration.
    fn registered_services(&self) -> Vec<TypeId>;
}

impl<P: ObjectProvider + ?Sized> ObjectProvider for Arc<P> {
    fn provide_instances_of(&self, service: TypeId) -> Vec<Instance> {
        (**self).provide_instances_of(service)
    }

    fn registered_services(&self) -> Vec<TypeId> {
        (**self).registered_services()
    }
}

/// Service key under which command handlers for `C` are registered.
#[must_use]
pub fn command_handler_key<C: Command>() -> TypeId {
    TypeId::of::<dyn CommandHandler<C>>()
}

/// Service key under which event handlers for `E` are registered.
#[must_use]
pub fn event_handler_key<E: Event>() -> TypeId {
    TypeId::of::<dyn EventHandler<E>>()
}

/// Registration-time builder for a [`ServiceProvider`].
///
/// # Example
///
/// ```
/// use basniowa_core::provider::{ObjectProvider, ServiceCollection, command_handler_key};
/// use basniowa_core::command;
/// use basniowa_core::handler::{CommandHandler, HandlerFuture};
///
/// #[derive(Debug)]
/// struct Ping;
/// command!(Ping);
///
/// struct PingHandler;
/// impl CommandHandler<Ping> for PingHandler {
///     fn handle<'a>(&'a self, _: &'a mut Ping) -> HandlerFuture<'a> {
///         Box::pin(async { Ok(()) })
///     }
/// }
///
/// let provider = ServiceCollection::new()
///     .with_command_handler::<Ping, _>(PingHandler)
///     .build();
/// assert_eq!(provider.provide_instances_of(command_handler_key::<Ping>()).len(), 1);
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    services: HashMap<TypeId, Vec<(&'static str, Instance)>>,
}

impl ServiceCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command handler for `C`.
    pub fn add_command_handler<C, H>(&mut self, handler: H) -> &mut Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.add_shared_command_handler::<C>(Arc::new(handler))
    }

    /// Register an already shared command handler for `C`.
    pub fn add_shared_command_handler<C: Command>(
        &mut self,
        handler: Arc<dyn CommandHandler<C>>,
    ) -> &mut Self {
        let name = handler.handler_name();
        self.add_instance(command_handler_key::<C>(), name, Arc::new(handler))
    }

    /// Register an event handler for `E`.
    pub fn add_event_handler<E, H>(&mut self, handler: H) -> &mut Self
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        self.add_shared_event_handler::<E>(Arc::new(handler))
    }

    /// Register an already shared event handler for `E`.
    pub fn add_shared_event_handler<E: Event>(
        &mut self,
        handler: Arc<dyn EventHandler<E>>,
    ) -> &mut Self {
        let name = handler.handler_name();
        self.add_instance(event_handler_key::<E>(), name, Arc::new(handler))
    }

    /// Register a plain service instance under its own type.
    pub fn add_singleton<T: Any + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.add_instance(
            TypeId::of::<T>(),
            std::any::type_name::<T>(),
            Arc::new(instance),
        )
    }

    fn add_instance(
        &mut self,
        service: TypeId,
        name: &'static str,
        instance: Instance,
    ) -> &mut Self {
        tracing::trace!(service = name, "Registering service instance");
        self.services.entry(service).or_default().push((name, instance));
        self
    }

    /// Builder-style [`add_command_handler`](Self::add_command_handler).
    #[must_use]
    pub fn with_command_handler<C, H>(mut self, handler: H) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.add_command_handler::<C, H>(handler);
        self
    }

    /// Builder-style [`add_event_handler`](Self::add_event_handler).
    #[must_use]
    pub fn with_event_handler<E, H>(mut self, handler: H) -> Self
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        self.add_event_handler::<E, H>(handler);
        self
    }

    /// Freeze the registrations.
    #[must_use]
    pub fn build(self) -> ServiceProvider {
        let registrations: usize = self.services.values().map(Vec::len).sum();
        tracing::debug!(
            services = self.services.len(),
            registrations,
            "Service provider built"
        );
        ServiceProvider {
            services: self.services,
        }
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("services", &self.services.len())
            .finish()
    }
}

/// Immutable container produced by [`ServiceCollection::build`].
pub struct ServiceProvider {
    services: HashMap<TypeId, Vec<(&'static str, Instance)>>,
}

impl ServiceProvider {
    /// Fetch the first plain service registered under `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|instances| instances.first())
            .and_then(|(_, instance)| Arc::clone(instance).downcast::<T>().ok())
    }

    /// Names of the instances registered for `service`, in registration order.
    #[must_use]
    pub fn registered_names(&self, service: TypeId) -> Vec<&'static str> {
        self.services
            .get(&service)
            .map(|instances| instances.iter().map(|(name, _)| *name).collect())
            .unwrap_or_default()
    }
}

impl ObjectProvider for ServiceProvider {
    fn provide_instances_of(&self, service: TypeId) -> Vec<Instance> {
        self.services
            .get(&service)
            .map(|instances| {
                instances
                    .iter()
                    .map(|(_, instance)| Arc::clone(instance))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn registered_services(&self) -> Vec<TypeId> {
        self.services.keys().copied().collect()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.services.len())
            .finish()
    }
}

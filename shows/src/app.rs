//! Startup wiring: container, resolver, bus, identifier service.

use crate::commands::{
    AddShowCommand, AddShowPictureCommand, DeleteShowCommand, UpdateShowCommand,
};
use crate::events::{ShowAdded, ShowDeleted, ShowPictureAdded, ShowUpdated};
use crate::handlers::{ShowEventPublisher, ShowHistory, ShowsCommandHandler};
use crate::publisher::DeferredPublisher;
use crate::reader::ShowsReader;
use crate::service::ShowsCommandService;
use crate::store::ShowsStore;
use basniowa_core::provider::{ServiceCollection, ServiceProvider};
use basniowa_core::resolver::ProviderHandlerResolver;
use basniowa_core::sequence::UniqueIdService;
use basniowa_runtime::config::DispatchConfig;
use basniowa_runtime::{MessageBus, WeakMessageBus};
use std::fmt;
use std::sync::Arc;

/// Bus type used by the show-management application.
pub type ShowsBus = MessageBus<ProviderHandlerResolver<ServiceProvider>>;

/// Handle through which the command handlers publish without owning the bus.
type ShowsBusHandle = WeakMessageBus<ProviderHandlerResolver<ServiceProvider>>;

/// Register the show command handlers and the history event handler.
///
/// One [`ShowsCommandHandler`] instance serves all four commands; one [`ShowHistory`]
/// instance receives all four events.
pub fn register_shows<P: ShowEventPublisher>(
    services: &mut ServiceCollection,
    store: &Arc<ShowsStore>,
    ids: &Arc<dyn UniqueIdService>,
    events: P,
    history: &Arc<ShowHistory>,
) {
    let commands = Arc::new(ShowsCommandHandler::new(Arc::clone(store), Arc::clone(ids), events));
    services
        .add_shared_command_handler::<AddShowCommand>(commands.clone())
        .add_shared_command_handler::<UpdateShowCommand>(commands.clone())
        .add_shared_command_handler::<DeleteShowCommand>(commands.clone())
        .add_shared_command_handler::<AddShowPictureCommand>(commands);

    services
        .add_shared_event_handler::<ShowAdded>(history.clone())
        .add_shared_event_handler::<ShowUpdated>(history.clone())
        .add_shared_event_handler::<ShowDeleted>(history.clone())
        .add_shared_event_handler::<ShowPictureAdded>(history.clone());
}

/// Fully wired show-management application.
#[derive(Clone)]
pub struct ShowsApp {
    /// Command sender and event publisher
    pub bus: ShowsBus,
    /// Write model
    pub store: Arc<ShowsStore>,
    /// Audit history
    pub history: Arc<ShowHistory>,
    /// Read model
    pub reader: ShowsReader,
    /// Identifier allocation
    pub ids: Arc<dyn UniqueIdService>,
}

impl fmt::Debug for ShowsApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShowsApp")
            .field("bus", &self.bus)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ShowsApp {
    /// Wire the application around `ids`.
    ///
    /// `extend` may register further handlers (e.g. extra event subscribers) before the
    /// container is frozen.
    #[must_use]
    pub fn build_with<F>(
        ids: Arc<dyn UniqueIdService>,
        dispatch: &DispatchConfig,
        extend: F,
    ) -> Self
    where
        F: FnOnce(&mut ServiceCollection),
    {
        let store = Arc::new(ShowsStore::new());
        let history = Arc::new(ShowHistory::new());
        let events = DeferredPublisher::<ShowsBusHandle>::new();

        let mut services = ServiceCollection::new();
        register_shows(&mut services, &store, &ids, events.clone(), &history);
        extend(&mut services);

        let bus = MessageBus::builder(ProviderHandlerResolver::new(services.build()))
            .config(dispatch)
            .build();
        events.bind(bus.downgrade());
        tracing::info!(mode = %bus.event_dispatch_mode(), "Show management wired");

        Self {
            bus,
            reader: ShowsReader::new(Arc::clone(&store)),
            store,
            history,
            ids,
        }
    }

    /// Wire the application with no extra registrations.
    #[must_use]
    pub fn build(ids: Arc<dyn UniqueIdService>, dispatch: &DispatchConfig) -> Self {
        Self::build_with(ids, dispatch, |_| {})
    }

    /// Validating command front door over this application's bus.
    #[must_use]
    pub fn commands(&self) -> ShowsCommandService<ShowsBus> {
        ShowsCommandService::new(self.bus.clone())
    }
}

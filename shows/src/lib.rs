//! # Basniowa Shows
//!
//! Show management for a puppet theatre, built on the Basniowa dispatch core.
//!
//! Commands go through [`ShowsCommandService`] (validation) to the [`MessageBus`]
//! (routing) to [`ShowsCommandHandler`] (write model), which publishes events that
//! [`ShowHistory`] records. [`ShowsReader`] serves the read side.
//!
//! [`MessageBus`]: basniowa_runtime::MessageBus
//!
//! ## Example
//!
//! ```
//! use basniowa_core::sequence::UniqueIdService;
//! use basniowa_runtime::config::DispatchConfig;
//! use basniowa_runtime::{BufferedIdService, InMemorySequenceProvider};
//! use basniowa_shows::{AddShowCommand, ShowsApp};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let ids: Arc<dyn UniqueIdService> =
//!     Arc::new(BufferedIdService::new(InMemorySequenceProvider::new(), 10));
//! let app = ShowsApp::build(ids, &DispatchConfig::default());
//!
//! let show_id = app
//!     .commands()
//!     .add(
//!         AddShowCommand {
//!             title: "Czerwony Kapturek".into(),
//!             description: "Spotkanie z wilkiem.".into(),
//!             ..AddShowCommand::default()
//!         },
//!         "admin",
//!     )
//!     .await
//!     .unwrap();
//!
//! let show = app.reader.get_show_by_id(show_id).await.unwrap();
//! assert_eq!(show.title, "Czerwony Kapturek");
//! # });
//! ```

pub mod app;
pub mod commands;
pub mod error;
pub mod events;
pub mod handlers;
pub mod publisher;
pub mod reader;
pub mod service;
pub mod store;

pub use app::{ShowsApp, ShowsBus, register_shows};
pub use commands::{AddShowCommand, AddShowPictureCommand, DeleteShowCommand, UpdateShowCommand};
pub use error::{
    EntityAlreadyExists, EntityNotFound, EventNotPublished, ShowsError, ValidationError,
};
pub use events::{ShowAdded, ShowDeleted, ShowPictureAdded, ShowUpdated};
pub use handlers::{HistoryEntry, ShowHistory, ShowsCommandHandler};
pub use publisher::DeferredPublisher;
pub use reader::{ShowHeader, ShowWithDetails, ShowsReader};
pub use service::ShowsCommandService;
pub use store::ShowsStore;

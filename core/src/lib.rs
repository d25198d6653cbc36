//! # Basniowa Core
//!
//! Core traits and types for in-process command/event dispatch.
//!
//! Every write in the application goes through this contract: a caller sends a command or
//! publishes an event, a resolver finds the handler(s), and the bus applies the
//! command/event failure policy. Handlers that create entities draw identifiers from a
//! [`UniqueIdService`](sequence::UniqueIdService) backed by a block-reserving
//! [`SequenceProvider`](sequence::SequenceProvider).
//!
//! ## Components
//!
//! - [`message`]: Command/Event classification
//! - [`handler`]: Handler traits
//! - [`provider`]: Object-provider capability and a minimal container
//! - [`resolver`]: Message type to handler mapping
//! - [`bus`]: Sender/publisher contracts
//! - [`report`]: Out-of-band failure reporting
//! - [`sequence`]: Identifier blocks and the id-service contract
//! - [`error`]: Error taxonomy
//!
//! Implementations of the bus and the buffered id service live in `basniowa-runtime`.
//!
//! ## Example
//!
//! ```
//! use basniowa_core::command;
//! use basniowa_core::handler::{CommandHandler, HandlerFuture};
//! use basniowa_core::provider::ServiceCollection;
//! use basniowa_core::resolver::{HandlerResolver, ProviderHandlerResolver};
//!
//! #[derive(Debug, Default)]
//! struct DeleteShow {
//!     show_id: i64,
//! }
//! command!(DeleteShow);
//!
//! struct DeleteShowHandler;
//!
//! impl CommandHandler<DeleteShow> for DeleteShowHandler {
//!     fn handle<'a>(&'a self, command: &'a mut DeleteShow) -> HandlerFuture<'a> {
//!         Box::pin(async move {
//!             basniowa_core::anyhow::ensure!(command.show_id > 0, "invalid show id");
//!             Ok(())
//!         })
//!     }
//! }
//!
//! let resolver = ProviderHandlerResolver::new(
//!     ServiceCollection::new()
//!         .with_command_handler::<DeleteShow, _>(DeleteShowHandler)
//!         .build(),
//! );
//! let handlers = resolver.command_handlers::<DeleteShow>().unwrap_or_default();
//! assert_eq!(handlers.len(), 1);
//! ```

pub mod bus;
pub mod error;
pub mod handler;
pub mod message;
pub mod provider;
pub mod report;
pub mod resolver;
pub mod sequence;

pub use error::{DispatchError, IdError, SequenceError};
pub use message::{Command, Event, Message, MessageKind};

// Re-exported so downstream handler crates share one error type.
pub use anyhow;

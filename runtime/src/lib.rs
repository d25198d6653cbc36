//! # Basniowa Runtime
//!
//! Runtime implementations for the dispatch core:
//!
//! - [`bus::MessageBus`]: command sender and event publisher
//! - [`id_service::BufferedIdService`]: block-buffered unique identifiers
//! - [`sequence::InMemorySequenceProvider`]: process-local sequence source
//! - [`config`], [`telemetry`], [`metrics`]: ambient wiring
//!
//! ## Example
//!
//! ```
//! use basniowa_core::provider::ServiceCollection;
//! use basniowa_core::resolver::ProviderHandlerResolver;
//! use basniowa_runtime::{Config, MessageBus, BufferedIdService, InMemorySequenceProvider};
//!
//! let config = Config::default();
//! let bus = MessageBus::builder(ProviderHandlerResolver::new(ServiceCollection::new().build()))
//!     .config(&config.dispatch)
//!     .build();
//! let ids = BufferedIdService::from_config(InMemorySequenceProvider::new(), &config.id_service);
//! assert_eq!(ids.block_size(), 10);
//! # drop(bus);
//! ```

pub mod bus;
pub mod config;
pub mod id_service;
pub mod metrics;
pub mod sequence;
pub mod telemetry;

pub use bus::{MessageBus, MessageBusBuilder, WeakMessageBus};
pub use config::{Config, EventDispatchMode};
pub use id_service::BufferedIdService;
pub use sequence::InMemorySequenceProvider;

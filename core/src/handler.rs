//! Handler traits.
//!
//! Handlers return boxed futures instead of using `async fn` so that they can be stored
//! as `Arc<dyn CommandHandler<C>>` and handed out by a resolver.

use crate::message::{Command, Event};
use std::future::Future;
use std::pin::Pin;

/// Outcome of a handler. The error is whatever domain failure the handler raised.
pub type HandlerResult = Result<(), anyhow::Error>;

/// Boxed future returned by handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>>;

/// Processes one command type.
///
/// The command is borrowed mutably so the handler can write generated data back into it
/// (for example a freshly allocated identifier) for the sender to read after dispatch.
///
/// # Example
///
/// ```
/// use basniowa_core::command;
/// use basniowa_core::handler::{CommandHandler, HandlerFuture};
///
/// #[derive(Debug, Default)]
/// struct CreateShow {
///     show_id: i64,
/// }
/// command!(CreateShow);
///
/// struct CreateShowHandler;
///
/// impl CommandHandler<CreateShow> for CreateShowHandler {
///     fn handle<'a>(&'a self, command: &'a mut CreateShow) -> HandlerFuture<'a> {
///         Box::pin(async move {
///             command.show_id = 42;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Handle the command.
    ///
    /// # Errors
    ///
    /// Any domain failure; the bus hands it to the sender unchanged.
    fn handle<'a>(&'a self, command: &'a mut C) -> HandlerFuture<'a>;

    /// Name used when reporting failures.
    fn handler_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Reacts to one event type.
pub trait EventHandler<E: Event>: Send + Sync {
    /// Handle the event.
    ///
    /// # Errors
    ///
    /// Any failure; the bus reports it out-of-band and never returns it to the publisher.
    fn handle<'a>(&'a self, event: &'a E) -> HandlerFuture<'a>;

    /// Name used when reporting failures.
    fn handler_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

//! Message classification: commands and events.
//!
//! Every message is a plain data record tagged with exactly one kind. The kind is carried
//! as an associated type, so a type implementing [`Command`] can never also implement
//! [`Event`] and the bus never has to reinterpret it.
//!
//! # Example
//!
//! ```
//! use basniowa_core::{command, event};
//! use basniowa_core::message::{Message, MessageKind};
//!
//! #[derive(Debug, Default)]
//! struct RenameShow {
//!     show_id: i64,
//!     title: String,
//! }
//! command!(RenameShow);
//!
//! #[derive(Debug, Clone)]
//! struct ShowRenamed {
//!     show_id: i64,
//! }
//! event!(ShowRenamed);
//!
//! assert_eq!(RenameShow::kind(), MessageKind::Command);
//! assert_eq!(ShowRenamed::kind(), MessageKind::Event);
//! ```

use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// Type-level marker for a message kind. Sealed: only [`CommandKind`] and [`EventKind`] exist.
pub trait Kind: sealed::Sealed + Send + Sync + 'static {
    /// Runtime value of this kind
    const KIND: MessageKind;
}

/// Kind marker for commands.
#[derive(Debug, Clone, Copy)]
pub enum CommandKind {}

/// Kind marker for events.
#[derive(Debug, Clone, Copy)]
pub enum EventKind {}

impl sealed::Sealed for CommandKind {}
impl sealed::Sealed for EventKind {}

impl Kind for CommandKind {
    const KIND: MessageKind = MessageKind::Command;
}

impl Kind for EventKind {
    const KIND: MessageKind = MessageKind::Event;
}

/// Runtime view of a message kind, for logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Instruction to change state; exactly one handler
    Command,
    /// Notification that state changed; zero or more handlers
    Event,
}

impl MessageKind {
    /// Lowercase label used as a metrics/log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message routed by the bus.
pub trait Message: fmt::Debug + Send + Sync + 'static {
    /// Either [`CommandKind`] or [`EventKind`]
    type Kind: Kind;

    /// Name used in logs, metrics and errors. Defaults to the Rust type name.
    #[must_use]
    fn message_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    /// Runtime kind of this message type.
    #[must_use]
    fn kind() -> MessageKind
    where
        Self: Sized,
    {
        <Self::Kind as Kind>::KIND
    }
}

/// An instruction to change state. Must resolve to exactly one handler.
pub trait Command: Message<Kind = CommandKind> {}

/// A notification that state has changed. May have any number of handlers.
pub trait Event: Message<Kind = EventKind> {}

/// Implement [`Message`] and [`Command`] for a type.
#[macro_export]
macro_rules! command {
    ($ty:ty) => {
        impl $crate::message::Message for $ty {
            type Kind = $crate::message::CommandKind;
        }
        impl $crate::message::Command for $ty {}
    };
}

/// Implement [`Message`] and [`Event`] for a type.
#[macro_export]
macro_rules! event {
    ($ty:ty) => {
        impl $crate::message::Message for $ty {
            type Kind = $crate::message::EventKind;
        }
        impl $crate::message::Event for $ty {}
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;
    crate::command!(Ping);

    #[derive(Debug)]
    struct Pinged;
    crate::event!(Pinged);

    #[derive(Debug)]
    struct Renamed;

    impl Message for Renamed {
        type Kind = EventKind;

        fn message_name() -> &'static str {
            "shows.renamed"
        }
    }

    impl Event for Renamed {}

    #[test]
    fn kind_is_fixed_by_definition() {
        assert_eq!(Ping::kind(), MessageKind::Command);
        assert_eq!(Pinged::kind(), MessageKind::Event);
    }

    #[test]
    fn message_name_defaults_to_type_name() {
        assert!(Ping::message_name().ends_with("Ping"));
        assert_eq!(Renamed::message_name(), "shows.renamed");
    }

    #[test]
    fn kind_labels() {
        assert_eq!(MessageKind::Command.to_string(), "command");
        assert_eq!(MessageKind::Event.as_str(), "event");
    }
}

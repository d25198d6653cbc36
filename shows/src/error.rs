//! Domain errors for show management.

use basniowa_core::error::DispatchError;
use thiserror::Error;

/// A show (or other entity) does not exist or has been deleted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity} not found: {key}")]
pub struct EntityNotFound {
    /// Kind of entity looked up
    pub entity: &'static str,
    /// Lookup key, e.g. `Id=42`
    pub key: String,
}

impl EntityNotFound {
    /// A missing show with the given identifier.
    #[must_use]
    pub fn show(show_id: i64) -> Self {
        Self {
            entity: "Show",
            key: format!("Id={show_id}"),
        }
    }
}

/// An entity with this identifier already exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity} already exists: {key}")]
pub struct EntityAlreadyExists {
    /// Kind of entity
    pub entity: &'static str,
    /// Conflicting key
    pub key: String,
}

/// A show change was committed but its event could not be handed to the bus.
///
/// The write stands and any generated identifier has already been written back into the
/// command. Retrying the command would apply the change a second time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Show {show_id} was saved but {event} was not published: {reason}")]
pub struct EventNotPublished {
    /// Show whose change was committed
    pub show_id: i64,
    /// Name of the event that was dropped
    pub event: &'static str,
    /// Why publishing failed
    pub reason: String,
}

/// A command was rejected before dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{field} is required")]
    Required {
        /// Offending field
        field: &'static str,
    },

    /// A field exceeded its maximum length (in characters).
    #[error("{field} must be at most {max} characters, got {actual}")]
    TooLong {
        /// Offending field
        field: &'static str,
        /// Maximum allowed length
        max: usize,
        /// Actual length
        actual: usize,
    },
}

/// Outcome of a show-management request as seen by an API caller.
#[derive(Error, Debug)]
pub enum ShowsError {
    /// The request failed validation and was never dispatched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The targeted show does not exist.
    #[error(transparent)]
    NotFound(EntityNotFound),

    /// The change was saved but subscribers were not notified.
    #[error(transparent)]
    NotPublished(EventNotPublished),

    /// Any other dispatch failure.
    #[error(transparent)]
    Dispatch(DispatchError),
}

impl From<DispatchError> for ShowsError {
    fn from(err: DispatchError) -> Self {
        if let Some(not_found) = err.downcast_handler_error::<EntityNotFound>() {
            return Self::NotFound(not_found.clone());
        }
        if let Some(not_published) = err.downcast_handler_error::<EventNotPublished>() {
            return Self::NotPublished(not_published.clone());
        }
        Self::Dispatch(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_recovered_from_handler_failure() {
        let err = DispatchError::Handler(EntityNotFound::show(7).into());
        let mapped = ShowsError::from(err);
        assert!(matches!(mapped, ShowsError::NotFound(ref e) if e.key == "Id=7"));
        assert_eq!(mapped.to_string(), "Show not found: Id=7");
    }

    #[test]
    fn unpublished_event_is_recovered_from_handler_failure() {
        let err = DispatchError::Handler(
            EventNotPublished {
                show_id: 4,
                event: "ShowAdded",
                reason: "bus gone".into(),
            }
            .into(),
        );
        assert!(matches!(
            ShowsError::from(err),
            ShowsError::NotPublished(EventNotPublished { show_id: 4, .. })
        ));
    }

    #[test]
    fn other_failures_stay_dispatch_errors() {
        let mapped = ShowsError::from(DispatchError::NoHandler { command: "AddShow" });
        assert!(matches!(mapped, ShowsError::Dispatch(DispatchError::NoHandler { .. })));
    }
}

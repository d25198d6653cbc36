//! Request-level entry points: validate, stamp the user, send.

use crate::commands::{AddShowCommand, AddShowPictureCommand, DeleteShowCommand, UpdateShowCommand};
use crate::error::ShowsError;
use basniowa_core::bus::CommandSender;
use basniowa_core::error::DispatchError;

/// Sender able to route every show command.
pub trait ShowCommandSender:
    CommandSender<AddShowCommand>
    + CommandSender<UpdateShowCommand>
    + CommandSender<DeleteShowCommand>
    + CommandSender<AddShowPictureCommand>
{
}

impl<S> ShowCommandSender for S where
    S: CommandSender<AddShowCommand>
        + CommandSender<UpdateShowCommand>
        + CommandSender<DeleteShowCommand>
        + CommandSender<AddShowPictureCommand>
{
}

/// Front door for show commands, as an API layer would use it.
///
/// Invalid commands are rejected with [`ShowsError::Validation`] and never reach the
/// sender. A handler raising [`EntityNotFound`](crate::error::EntityNotFound) surfaces as
/// [`ShowsError::NotFound`]. A change that was saved but whose event could not be published
/// surfaces as [`ShowsError::NotPublished`] and must not be retried.
#[derive(Debug, Clone)]
pub struct ShowsCommandService<S> {
    sender: S,
}

impl<S: ShowCommandSender> ShowsCommandService<S> {
    /// Create a service sending through `sender`.
    #[must_use]
    pub const fn new(sender: S) -> Self {
        Self { sender }
    }

    /// Create a show on behalf of `user_name` and return its identifier.
    ///
    /// # Errors
    ///
    /// Validation, dispatch or handler failure.
    pub async fn add(
        &self,
        mut command: AddShowCommand,
        user_name: &str,
    ) -> Result<i64, ShowsError> {
        command.validate()?;
        command.user_name = user_name.to_string();
        CommandSender::<AddShowCommand>::send(&self.sender, &mut command).await?;
        command.show_id.ok_or_else(|| unassigned("show"))
    }

    /// Replace a show's editable fields.
    ///
    /// # Errors
    ///
    /// Validation failure, [`ShowsError::NotFound`], or dispatch failure.
    pub async fn update(
        &self,
        mut command: UpdateShowCommand,
        user_name: &str,
    ) -> Result<(), ShowsError> {
        command.validate()?;
        command.user_name = user_name.to_string();
        CommandSender::<UpdateShowCommand>::send(&self.sender, &mut command).await?;
        Ok(())
    }

    /// Mark a show as deleted.
    ///
    /// # Errors
    ///
    /// [`ShowsError::NotFound`] or dispatch failure.
    pub async fn delete(&self, show_id: i64, user_name: &str) -> Result<(), ShowsError> {
        let mut command = DeleteShowCommand {
            show_id,
            user_name: user_name.to_string(),
        };
        CommandSender::<DeleteShowCommand>::send(&self.sender, &mut command).await?;
        Ok(())
    }

    /// Attach a picture and return its identifier.
    ///
    /// # Errors
    ///
    /// Validation failure, [`ShowsError::NotFound`], or dispatch failure.
    pub async fn add_picture(
        &self,
        mut command: AddShowPictureCommand,
        user_name: &str,
    ) -> Result<i64, ShowsError> {
        command.validate()?;
        command.user_name = user_name.to_string();
        CommandSender::<AddShowPictureCommand>::send(&self.sender, &mut command).await?;
        command.show_picture_id.ok_or_else(|| unassigned("show picture"))
    }
}

fn unassigned(entity: &str) -> ShowsError {
    ShowsError::Dispatch(DispatchError::Handler(anyhow::anyhow!(
        "handler did not assign a {entity} identifier"
    )))
}

//! Show-management commands and their validation rules.

use crate::error::ValidationError;
use basniowa_core::command;
use std::collections::BTreeMap;

/// Maximum title length in characters.
pub const TITLE_MAX_LEN: usize = 200;
/// Maximum subtitle length in characters.
pub const SUBTITLE_MAX_LEN: usize = 500;

/// Creates a show. The handler writes the assigned identifier back into `show_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddShowCommand {
    /// Title (required)
    pub title: String,
    /// Optional subtitle
    pub subtitle: Option<String>,
    /// Description (required)
    pub description: String,
    /// Free-form properties (e.g. duration, age group)
    pub properties: BTreeMap<String, String>,
    /// Who issued the command
    pub user_name: String,
    /// Identifier of the new show; allocated by the handler if `None`
    pub show_id: Option<i64>,
}
command!(AddShowCommand);

impl AddShowCommand {
    /// Check the command before sending it.
    ///
    /// # Errors
    ///
    /// Returns the first rule the command breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_show_fields(&self.title, self.subtitle.as_deref(), &self.description)
    }
}

/// Replaces the editable fields of an existing show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateShowCommand {
    /// Show to update
    pub show_id: i64,
    /// New title
    pub title: String,
    /// New subtitle
    pub subtitle: Option<String>,
    /// New description
    pub description: String,
    /// New properties; replaces the old set
    pub properties: BTreeMap<String, String>,
    /// Who issued the command
    pub user_name: String,
}
command!(UpdateShowCommand);

impl UpdateShowCommand {
    /// Check the command before sending it.
    ///
    /// # Errors
    ///
    /// Returns the first rule the command breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_show_fields(&self.title, self.subtitle.as_deref(), &self.description)
    }
}

/// Marks a show as deleted. Deleted shows disappear from every read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteShowCommand {
    /// Show to delete
    pub show_id: i64,
    /// Who issued the command
    pub user_name: String,
}
command!(DeleteShowCommand);

/// Attaches a picture to a show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddShowPictureCommand {
    /// Show the picture belongs to
    pub show_id: i64,
    /// Original file name
    pub file_name: String,
    /// Who issued the command
    pub user_name: String,
    /// Identifier of the new picture; allocated by the handler if `None`
    pub show_picture_id: Option<i64>,
}
command!(AddShowPictureCommand);

impl AddShowPictureCommand {
    /// Check the command before sending it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] for a blank file name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("file_name", &self.file_name)
    }
}

fn validate_show_fields(
    title: &str,
    subtitle: Option<&str>,
    description: &str,
) -> Result<(), ValidationError> {
    required("title", title)?;
    max_len("title", title, TITLE_MAX_LEN)?;
    if let Some(subtitle) = subtitle {
        max_len("subtitle", subtitle, SUBTITLE_MAX_LEN)?;
    }
    required("description", description)
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AddShowCommand {
        AddShowCommand {
            title: "Kot w butach".into(),
            subtitle: Some("Bajka muzyczna".into()),
            description: "Przygody sprytnego kota.".into(),
            ..AddShowCommand::default()
        }
    }

    #[test]
    fn accepts_valid_show() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn title_and_description_are_required() {
        let blank_title = AddShowCommand {
            title: "   ".into(),
            ..valid()
        };
        assert_eq!(
            blank_title.validate(),
            Err(ValidationError::Required { field: "title" })
        );

        let no_description = AddShowCommand {
            description: String::new(),
            ..valid()
        };
        assert_eq!(
            no_description.validate(),
            Err(ValidationError::Required {
                field: "description"
            })
        );
    }

    #[test]
    fn lengths_are_counted_in_characters() {
        let at_limit = AddShowCommand {
            title: "ż".repeat(TITLE_MAX_LEN),
            ..valid()
        };
        assert_eq!(at_limit.validate(), Ok(()));

        let long_subtitle = UpdateShowCommand {
            show_id: 1,
            title: "Title".into(),
            subtitle: Some("x".repeat(SUBTITLE_MAX_LEN + 1)),
            description: "Description".into(),
            ..UpdateShowCommand::default()
        };
        assert_eq!(
            long_subtitle.validate(),
            Err(ValidationError::TooLong {
                field: "subtitle",
                max: SUBTITLE_MAX_LEN,
                actual: SUBTITLE_MAX_LEN + 1
            })
        );
    }

    #[test]
    fn picture_needs_file_name() {
        let command = AddShowPictureCommand {
            show_id: 1,
            ..AddShowPictureCommand::default()
        };
        assert_eq!(
            command.validate(),
            Err(ValidationError::Required { field: "file_name" })
        );
    }
}

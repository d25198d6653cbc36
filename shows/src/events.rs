//! Events published after a show-management command succeeds.

use basniowa_core::event;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A show was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowAdded {
    /// New show
    pub show_id: i64,
    /// Title at creation
    pub title: String,
    /// Subtitle at creation
    pub subtitle: Option<String>,
    /// Description at creation
    pub description: String,
    /// Properties at creation
    pub properties: BTreeMap<String, String>,
    /// Who created it
    pub user_name: String,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}
event!(ShowAdded);

/// A show's editable fields were replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowUpdated {
    /// Updated show
    pub show_id: i64,
    /// New title
    pub title: String,
    /// Who updated it
    pub user_name: String,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}
event!(ShowUpdated);

/// A show was marked as deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowDeleted {
    /// Deleted show
    pub show_id: i64,
    /// Who deleted it
    pub user_name: String,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}
event!(ShowDeleted);

/// A picture was attached to a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowPictureAdded {
    /// Owning show
    pub show_id: i64,
    /// New picture
    pub show_picture_id: i64,
    /// Original file name
    pub file_name: String,
    /// Who added it
    pub user_name: String,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}
event!(ShowPictureAdded);

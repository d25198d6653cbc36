//! Read side: show listings and details.

use crate::error::EntityNotFound;
use crate::store::{ShowPicture, ShowsStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Summary row of a show listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowHeader {
    /// Identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Subtitle
    pub subtitle: Option<String>,
}

/// Everything known about a single show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowWithDetails {
    /// Identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Subtitle
    pub subtitle: Option<String>,
    /// Description
    pub description: String,
    /// Free-form properties
    pub properties: BTreeMap<String, String>,
    /// Identifiers and file names of attached pictures
    pub pictures: Vec<(i64, String)>,
}

/// Queries over [`ShowsStore`]. Deleted shows are never returned.
#[derive(Debug, Clone)]
pub struct ShowsReader {
    store: Arc<ShowsStore>,
}

impl ShowsReader {
    /// Create a reader over `store`.
    #[must_use]
    pub const fn new(store: Arc<ShowsStore>) -> Self {
        Self { store }
    }

    /// Headers of all live shows, ordered by identifier.
    pub async fn get_all_shows(&self) -> Vec<ShowHeader> {
        self.store
            .live()
            .await
            .into_iter()
            .map(|show| ShowHeader {
                id: show.id,
                title: show.title,
                subtitle: show.subtitle,
            })
            .collect()
    }

    /// Details of a live show.
    ///
    /// # Errors
    ///
    /// Returns [`EntityNotFound`] if the show does not exist or was deleted.
    pub async fn get_show_by_id(&self, show_id: i64) -> Result<ShowWithDetails, EntityNotFound> {
        let show = self
            .store
            .get(show_id)
            .await
            .ok_or_else(|| EntityNotFound::show(show_id))?;

        Ok(ShowWithDetails {
            id: show.id,
            title: show.title,
            subtitle: show.subtitle,
            description: show.description,
            properties: show.properties,
            pictures: show
                .pictures
                .into_iter()
                .map(|ShowPicture { id, file_name }| (id, file_name))
                .collect(),
        })
    }
}

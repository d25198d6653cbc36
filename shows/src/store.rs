//! In-memory write model for shows.

use crate::error::{EntityAlreadyExists, EntityNotFound};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// A picture attached to a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowPicture {
    /// Picture identifier
    pub id: i64,
    /// Original file name
    pub file_name: String,
}

/// Stored state of one show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowRecord {
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
    /// Attached pictures, in insertion order
    pub pictures: Vec<ShowPicture>,
    /// Soft-delete flag
    pub is_deleted: bool,
    /// Last user to modify the show
    pub modified_by: String,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

/// Shows keyed by identifier. Deleted shows are kept with `is_deleted` set.
#[derive(Debug, Default)]
pub struct ShowsStore {
    shows: RwLock<BTreeMap<i64, ShowRecord>>,
}

impl ShowsStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new show.
    ///
    /// # Errors
    ///
    /// Returns [`EntityAlreadyExists`] if the identifier is taken, even by a deleted show.
    pub async fn insert(&self, record: ShowRecord) -> Result<(), EntityAlreadyExists> {
        let mut shows = self.shows.write().await;
        if shows.contains_key(&record.id) {
            return Err(EntityAlreadyExists {
                entity: "Show",
                key: format!("Id={}", record.id),
            });
        }
        shows.insert(record.id, record);
        Ok(())
    }

    /// Apply `change` to a live show.
    ///
    /// # Errors
    ///
    /// Returns [`EntityNotFound`] if the show is missing or deleted.
    pub async fn modify<F>(&self, show_id: i64, change: F) -> Result<(), EntityNotFound>
    where
        F: FnOnce(&mut ShowRecord),
    {
        let mut shows = self.shows.write().await;
        let record = shows
            .get_mut(&show_id)
            .filter(|record| !record.is_deleted)
            .ok_or_else(|| EntityNotFound::show(show_id))?;
        change(record);
        Ok(())
    }

    /// A live show by identifier.
    pub async fn get(&self, show_id: i64) -> Option<ShowRecord> {
        self.shows
            .read()
            .await
            .get(&show_id)
            .filter(|record| !record.is_deleted)
            .cloned()
    }

    /// All live shows, ordered by identifier.
    pub async fn live(&self) -> Vec<ShowRecord> {
        self.shows
            .read()
            .await
            .values()
            .filter(|record| !record.is_deleted)
            .cloned()
            .collect()
    }

    /// Number of stored shows including deleted ones.
    pub async fn len(&self) -> usize {
        self.shows.read().await.len()
    }

    /// Whether nothing was ever stored.
    pub async fn is_empty(&self) -> bool {
        self.shows.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> ShowRecord {
        ShowRecord {
            id,
            title: format!("Show {id}"),
            subtitle: None,
            description: "Description".into(),
            properties: BTreeMap::new(),
            pictures: Vec::new(),
            is_deleted: false,
            modified_by: "tester".into(),
            modified_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn deleted_shows_are_hidden_but_kept() {
        let store = ShowsStore::new();
        assert!(store.insert(record(1)).await.is_ok());
        assert!(store.insert(record(2)).await.is_ok());

        assert!(store.modify(1, |show| show.is_deleted = true).await.is_ok());

        assert!(store.get(1).await.is_none());
        assert_eq!(store.live().await.len(), 1);
        assert_eq!(store.len().await, 2);
        assert_eq!(
            store.modify(1, |show| show.title.clear()).await,
            Err(EntityNotFound::show(1))
        );
    }

    #[tokio::test]
    async fn duplicate_identifier_is_rejected() {
        let store = ShowsStore::new();
        assert!(store.insert(record(5)).await.is_ok());
        assert!(store.insert(record(5)).await.is_err());
    }
}

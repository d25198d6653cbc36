//! Command handlers and the audit-history event handler.

use crate::commands::{
    AddShowCommand, AddShowPictureCommand, DeleteShowCommand, UpdateShowCommand,
};
use crate::error::{EntityNotFound, EventNotPublished};
use crate::events::{ShowAdded, ShowDeleted, ShowPictureAdded, ShowUpdated};
use crate::store::{ShowPicture, ShowRecord, ShowsStore};
use basniowa_core::bus::EventPublisher;
use basniowa_core::handler::{CommandHandler, EventHandler, HandlerFuture};
use basniowa_core::message::Event;
use basniowa_core::sequence::UniqueIdService;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Publisher able to announce every show event.
pub trait ShowEventPublisher:
    EventPublisher<ShowAdded>
    + EventPublisher<ShowUpdated>
    + EventPublisher<ShowDeleted>
    + EventPublisher<ShowPictureAdded>
    + 'static
{
}

impl<P> ShowEventPublisher for P where
    P: EventPublisher<ShowAdded>
        + EventPublisher<ShowUpdated>
        + EventPublisher<ShowDeleted>
        + EventPublisher<ShowPictureAdded>
        + 'static
{
}

/// Handles every show command against a [`ShowsStore`].
///
/// Each successful command publishes the matching event once the store has been updated.
/// Register one shared instance for all four command types.
///
/// The store write is committed before the event is published. If publishing fails the
/// write stays committed, generated identifiers are still written back, and the handler
/// fails with [`EventNotPublished`] so the caller knows not to repeat the command.
pub struct ShowsCommandHandler<P> {
    store: Arc<ShowsStore>,
    ids: Arc<dyn UniqueIdService>,
    events: P,
}

impl<P: ShowEventPublisher> ShowsCommandHandler<P> {
    /// Create a handler writing to `store`, allocating from `ids` and publishing to `events`.
    #[must_use]
    pub fn new(store: Arc<ShowsStore>, ids: Arc<dyn UniqueIdService>, events: P) -> Self {
        Self { store, ids, events }
    }

    async fn id_or_allocate(&self, requested: Option<i64>) -> anyhow::Result<i64> {
        match requested {
            Some(id) => Ok(id),
            None => Ok(self.ids.next_id().await?),
        }
    }

    async fn announce<E: Event>(&self, show_id: i64, event: E) -> anyhow::Result<()>
    where
        P: EventPublisher<E>,
    {
        EventPublisher::<E>::publish(&self.events, event)
            .await
            .map_err(|err| {
                tracing::error!(
                    show_id,
                    event = E::message_name(),
                    error = %err,
                    "Show change committed but event not published"
                );
                anyhow::Error::from(EventNotPublished {
                    show_id,
                    event: E::message_name(),
                    reason: err.to_string(),
                })
            })
    }

    async fn add_show(&self, command: &mut AddShowCommand) -> anyhow::Result<()> {
        let show_id = self.id_or_allocate(command.show_id).await?;
        let now = Utc::now();

        self.store
            .insert(ShowRecord {
                id: show_id,
                title: command.title.clone(),
                subtitle: command.subtitle.clone(),
                description: command.description.clone(),
                properties: command.properties.clone(),
                pictures: Vec::new(),
                is_deleted: false,
                modified_by: command.user_name.clone(),
                modified_at: now,
            })
            .await?;
        command.show_id = Some(show_id);
        tracing::info!(show_id, user = %command.user_name, "Show added");

        self.announce(show_id, ShowAdded {
            show_id,
            title: command.title.clone(),
            subtitle: command.subtitle.clone(),
            description: command.description.clone(),
            properties: command.properties.clone(),
            user_name: command.user_name.clone(),
            occurred_at: now,
        })
        .await
    }

    async fn update_show(&self, command: &UpdateShowCommand) -> anyhow::Result<()> {
        let now = Utc::now();
        self.store
            .modify(command.show_id, |show| {
                show.title.clone_from(&command.title);
                show.subtitle.clone_from(&command.subtitle);
                show.description.clone_from(&command.description);
                show.properties.clone_from(&command.properties);
                show.modified_by.clone_from(&command.user_name);
                show.modified_at = now;
            })
            .await?;
        tracing::info!(show_id = command.show_id, user = %command.user_name, "Show updated");

        self.announce(command.show_id, ShowUpdated {
            show_id: command.show_id,
            title: command.title.clone(),
            user_name: command.user_name.clone(),
            occurred_at: now,
        })
        .await
    }

    async fn delete_show(&self, command: &DeleteShowCommand) -> anyhow::Result<()> {
        let now = Utc::now();
        self.store
            .modify(command.show_id, |show| {
                show.is_deleted = true;
                show.modified_by.clone_from(&command.user_name);
                show.modified_at = now;
            })
            .await?;
        tracing::info!(show_id = command.show_id, user = %command.user_name, "Show deleted");

        self.announce(command.show_id, ShowDeleted {
            show_id: command.show_id,
            user_name: command.user_name.clone(),
            occurred_at: now,
        })
        .await
    }

    async fn add_picture(&self, command: &mut AddShowPictureCommand) -> anyhow::Result<()> {
        // Check the show first so a missing show does not burn an identifier.
        if self.store.get(command.show_id).await.is_none() {
            return Err(EntityNotFound::show(command.show_id).into());
        }
        let picture_id = self.id_or_allocate(command.show_picture_id).await?;
        let now = Utc::now();

        self.store
            .modify(command.show_id, |show| {
                show.pictures.push(ShowPicture {
                    id: picture_id,
                    file_name: command.file_name.clone(),
                });
                show.modified_by.clone_from(&command.user_name);
                show.modified_at = now;
            })
            .await?;
        command.show_picture_id = Some(picture_id);
        tracing::info!(show_id = command.show_id, picture_id, "Show picture added");

        self.announce(command.show_id, ShowPictureAdded {
            show_id: command.show_id,
            show_picture_id: picture_id,
            file_name: command.file_name.clone(),
            user_name: command.user_name.clone(),
            occurred_at: now,
        })
        .await
    }
}

impl<P: ShowEventPublisher> CommandHandler<AddShowCommand> for ShowsCommandHandler<P> {
    fn handle<'a>(&'a self, command: &'a mut AddShowCommand) -> HandlerFuture<'a> {
        Box::pin(self.add_show(command))
    }

    fn handler_name(&self) -> &'static str {
        "ShowsCommandHandler"
    }
}

impl<P: ShowEventPublisher> CommandHandler<UpdateShowCommand> for ShowsCommandHandler<P> {
    fn handle<'a>(&'a self, command: &'a mut UpdateShowCommand) -> HandlerFuture<'a> {
        Box::pin(self.update_show(command))
    }

    fn handler_name(&self) -> &'static str {
        "ShowsCommandHandler"
    }
}

impl<P: ShowEventPublisher> CommandHandler<DeleteShowCommand> for ShowsCommandHandler<P> {
    fn handle<'a>(&'a self, command: &'a mut DeleteShowCommand) -> HandlerFuture<'a> {
        Box::pin(self.delete_show(command))
    }

    fn handler_name(&self) -> &'static str {
        "ShowsCommandHandler"
    }
}

impl<P: ShowEventPublisher> CommandHandler<AddShowPictureCommand> for ShowsCommandHandler<P> {
    fn handle<'a>(&'a self, command: &'a mut AddShowPictureCommand) -> HandlerFuture<'a> {
        Box::pin(self.add_picture(command))
    }

    fn handler_name(&self) -> &'static str {
        "ShowsCommandHandler"
    }
}

/// One line of the audit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Show concerned
    pub show_id: i64,
    /// What happened (`added`, `updated`, `deleted`, `picture-added`)
    pub action: &'static str,
    /// Who did it
    pub user_name: String,
    /// When
    pub occurred_at: DateTime<Utc>,
}

/// Event handler appending one [`HistoryEntry`] per show event.
#[derive(Debug, Default)]
pub struct ShowHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl ShowHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in arrival order.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().clone()
    }

    /// Entries for one show.
    #[must_use]
    pub fn for_show(&self, show_id: i64) -> Vec<HistoryEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.show_id == show_id)
            .cloned()
            .collect()
    }

    fn record(
        &self,
        show_id: i64,
        action: &'static str,
        user_name: &str,
        occurred_at: DateTime<Utc>,
    ) -> HandlerFuture<'_> {
        self.lock().push(HistoryEntry {
            show_id,
            action,
            user_name: user_name.to_string(),
            occurred_at,
        });
        tracing::debug!(show_id, action, "History entry recorded");
        Box::pin(async { Ok(()) })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HistoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventHandler<ShowAdded> for ShowHistory {
    fn handle<'a>(&'a self, event: &'a ShowAdded) -> HandlerFuture<'a> {
        self.record(event.show_id, "added", &event.user_name, event.occurred_at)
    }
}

impl EventHandler<ShowUpdated> for ShowHistory {
    fn handle<'a>(&'a self, event: &'a ShowUpdated) -> HandlerFuture<'a> {
        self.record(event.show_id, "updated", &event.user_name, event.occurred_at)
    }
}

impl EventHandler<ShowDeleted> for ShowHistory {
    fn handle<'a>(&'a self, event: &'a ShowDeleted) -> HandlerFuture<'a> {
        self.record(event.show_id, "deleted", &event.user_name, event.occurred_at)
    }
}

impl EventHandler<ShowPictureAdded> for ShowHistory {
    fn handle<'a>(&'a self, event: &'a ShowPictureAdded) -> HandlerFuture<'a> {
        self.record(event.show_id, "picture-added", &event.user_name, event.occurred_at)
    }
}

//! End-to-end tests of the show-management flow through the message bus.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use basniowa_core::error::{IdError, SequenceError};
use basniowa_core::provider::ServiceCollection;
use basniowa_core::resolver::ProviderHandlerResolver;
use basniowa_core::sequence::UniqueIdService;
use basniowa_runtime::config::DispatchConfig;
use basniowa_runtime::{BufferedIdService, EventDispatchMode, InMemorySequenceProvider, MessageBus};
use basniowa_shows::{
    AddShowCommand, AddShowPictureCommand, DeferredPublisher, EntityNotFound, EventNotPublished,
    ShowAdded, ShowDeleted, ShowHistory, ShowsApp, ShowsBus, ShowsCommandService, ShowsError,
    ShowsStore, UpdateShowCommand, ValidationError, register_shows,
};
use basniowa_testing::{RecordingEventHandler, ScriptedSequenceProvider};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn in_memory_ids(block_size: u64) -> Arc<dyn UniqueIdService> {
    Arc::new(BufferedIdService::new(InMemorySequenceProvider::new(), block_size))
}

fn app() -> ShowsApp {
    basniowa_testing::init_test_tracing();
    ShowsApp::build(in_memory_ids(10), &DispatchConfig::default())
}

fn show(title: &str) -> AddShowCommand {
    AddShowCommand {
        title: title.into(),
        description: format!("{title}: opis"),
        ..AddShowCommand::default()
    }
}

#[tokio::test]
async fn added_show_gets_identifier_and_is_readable() {
    let app = app();
    let mut properties = BTreeMap::new();
    properties.insert("Wiek".to_string(), "4+".to_string());

    let show_id = app
        .commands()
        .add(
            AddShowCommand {
                subtitle: Some("Bajka".into()),
                properties: properties.clone(),
                ..show("Calineczka")
            },
            "anna",
        )
        .await
        .unwrap();

    assert_eq!(show_id, 1);
    let details = app.reader.get_show_by_id(show_id).await.unwrap();
    assert_eq!(details.title, "Calineczka");
    assert_eq!(details.subtitle.as_deref(), Some("Bajka"));
    assert_eq!(details.properties, properties);

    let history = app.history.for_show(show_id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "added");
    assert_eq!(history[0].user_name, "anna");
}

#[tokio::test]
async fn preassigned_identifier_is_kept() {
    let app = app();
    let show_id = app
        .commands()
        .add(
            AddShowCommand {
                show_id: Some(500),
                ..show("Pinokio")
            },
            "anna",
        )
        .await
        .unwrap();

    assert_eq!(show_id, 500);
    // No identifier was consumed.
    assert_eq!(app.ids.next_id().await, Ok(1));
}

#[tokio::test]
async fn listing_is_ordered_and_excludes_deleted() {
    let app = app();
    let commands = app.commands();
    let first = commands.add(show("Pierwszy"), "anna").await.unwrap();
    let second = commands.add(show("Drugi"), "anna").await.unwrap();
    let third = commands.add(show("Trzeci"), "anna").await.unwrap();

    commands.delete(second, "anna").await.unwrap();

    let listed: Vec<i64> = app.reader.get_all_shows().await.iter().map(|h| h.id).collect();
    assert_eq!(listed, vec![first, third]);
    assert_eq!(
        app.reader.get_show_by_id(second).await,
        Err(EntityNotFound::show(second))
    );
}

#[tokio::test]
async fn update_replaces_fields_and_is_recorded() {
    let app = app();
    let commands = app.commands();
    let show_id = commands.add(show("Stary tytuł"), "anna").await.unwrap();

    commands
        .update(
            UpdateShowCommand {
                show_id,
                title: "Nowy tytuł".into(),
                description: "Nowy opis".into(),
                ..UpdateShowCommand::default()
            },
            "piotr",
        )
        .await
        .unwrap();

    let details = app.reader.get_show_by_id(show_id).await.unwrap();
    assert_eq!(details.title, "Nowy tytuł");
    assert_eq!(details.description, "Nowy opis");
    let actions: Vec<_> = app.history.for_show(show_id).iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["added", "updated"]);
}

#[tokio::test]
async fn commands_on_missing_or_deleted_shows_are_not_found() {
    let app = app();
    let commands = app.commands();

    let update = UpdateShowCommand {
        show_id: 77,
        title: "Tytuł".into(),
        description: "Opis".into(),
        ..UpdateShowCommand::default()
    };
    assert!(matches!(
        commands.update(update, "anna").await,
        Err(ShowsError::NotFound(_))
    ));

    let show_id = commands.add(show("Do usunięcia"), "anna").await.unwrap();
    commands.delete(show_id, "anna").await.unwrap();
    let err = commands.delete(show_id, "anna").await.unwrap_err();
    assert!(matches!(err, ShowsError::NotFound(ref e) if *e == EntityNotFound::show(show_id)));
}

#[tokio::test]
async fn picture_gets_identifier_only_for_existing_show() {
    let app = app();
    let commands = app.commands();

    let missing = AddShowPictureCommand {
        show_id: 404,
        file_name: "plakat.png".into(),
        ..AddShowPictureCommand::default()
    };
    assert!(matches!(
        commands.add_picture(missing, "anna").await,
        Err(ShowsError::NotFound(_))
    ));

    let show_id = commands.add(show("Smok Wawelski"), "anna").await.unwrap();
    let picture_id = commands
        .add_picture(
            AddShowPictureCommand {
                show_id,
                file_name: "smok.jpg".into(),
                ..AddShowPictureCommand::default()
            },
            "anna",
        )
        .await
        .unwrap();

    // The rejected picture did not consume an identifier.
    assert_eq!((show_id, picture_id), (1, 2));
    let details = app.reader.get_show_by_id(show_id).await.unwrap();
    assert_eq!(details.pictures, vec![(2, "smok.jpg".to_string())]);
}

#[tokio::test]
async fn invalid_command_changes_nothing() {
    let app = app();
    let err = app
        .commands()
        .add(
            AddShowCommand {
                title: "x".repeat(201),
                ..show("ignored")
            },
            "anna",
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ShowsError::Validation(ValidationError::TooLong { field: "title", .. })
    ));
    assert!(app.store.is_empty().await);
    assert!(app.history.entries().is_empty());
}

#[tokio::test]
async fn failing_subscriber_does_not_fail_the_command() {
    let mailer = RecordingEventHandler::<ShowAdded>::failing("newsletter", "smtp down");
    let probe = mailer.probe();
    let app = ShowsApp::build_with(in_memory_ids(10), &DispatchConfig::default(), |services| {
        services.add_event_handler::<ShowAdded, _>(mailer);
    });

    let show_id = app.commands().add(show("Królewna Śnieżka"), "anna").await.unwrap();

    assert_eq!(probe.calls(), 1);
    assert_eq!(app.history.for_show(show_id).len(), 1);
}

#[tokio::test]
async fn identifier_outage_surfaces_to_the_caller() {
    let ids: Arc<dyn UniqueIdService> = Arc::new(BufferedIdService::new(
        ScriptedSequenceProvider::new([Err(SequenceError::Unavailable("db down".into()))]),
        10,
    ));
    let app = ShowsApp::build(ids, &DispatchConfig::default());

    let err = app.commands().add(show("Bolek i Lolek"), "anna").await.unwrap_err();

    let dispatch = match err {
        ShowsError::Dispatch(dispatch) => dispatch,
        other => panic!("expected dispatch error, got {other:?}"),
    };
    assert_eq!(
        dispatch.downcast_handler_error::<IdError>(),
        Some(&IdError::Sequence(SequenceError::Unavailable("db down".into())))
    );
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn background_dispatch_records_history_eventually() {
    let deleted = RecordingEventHandler::<ShowDeleted>::new("search-index");
    let probe = deleted.probe();
    let app = ShowsApp::build_with(
        in_memory_ids(10),
        &DispatchConfig {
            event_dispatch_mode: EventDispatchMode::Background,
        },
        |services| {
            services.add_event_handler::<ShowDeleted, _>(deleted);
        },
    );
    let commands = app.commands();

    let show_id = commands.add(show("Wilk i zając"), "anna").await.unwrap();
    commands.delete(show_id, "anna").await.unwrap();

    let mut waited = Duration::ZERO;
    while app.history.for_show(show_id).len() < 2 || probe.calls() < 1 {
        assert!(waited < Duration::from_secs(5), "background handlers never ran");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }
    assert_eq!(probe.calls(), 1);
}

#[tokio::test]
async fn unpublished_event_reports_the_committed_show() {
    let store = Arc::new(ShowsStore::new());
    let history = Arc::new(ShowHistory::new());
    let ids = in_memory_ids(10);
    let mut services = ServiceCollection::new();
    // Never bound, so every publish fails before reaching a handler.
    register_shows(
        &mut services,
        &store,
        &ids,
        DeferredPublisher::<ShowsBus>::new(),
        &history,
    );
    let commands =
        ShowsCommandService::new(MessageBus::new(ProviderHandlerResolver::new(services.build())));

    let err = commands.add(show("Jaś i Małgosia"), "anna").await.unwrap_err();

    let not_published = match err {
        ShowsError::NotPublished(not_published) => not_published,
        other => panic!("expected unpublished event, got {other:?}"),
    };
    assert!(matches!(
        not_published,
        EventNotPublished { show_id: 1, event, .. } if event.ends_with("ShowAdded")
    ));
    // The write stands and its identifier was consumed exactly once.
    assert_eq!(store.get(1).await.map(|s| s.title), Some("Jaś i Małgosia".to_string()));
    assert!(history.entries().is_empty());
    assert_eq!(ids.next_id().await, Ok(2));
}

#[tokio::test]
async fn dropping_the_app_releases_store_and_history() {
    let app = app();
    app.commands().add(show("Kopciuszek"), "anna").await.unwrap();
    let store = Arc::downgrade(&app.store);
    let history = Arc::downgrade(&app.history);

    drop(app);

    assert!(store.upgrade().is_none());
    assert!(history.upgrade().is_none());
}

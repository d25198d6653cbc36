//! Shows Demo - wiring walkthrough
//!
//! Builds the show-management application the way a host would at startup and runs an
//! add / update / picture / delete flow against it.
//!
//! # Running the Example
//!
//! ```bash
//! ID_BLOCK_SIZE=4 EVENT_DISPATCH_MODE=inline cargo run --bin shows-demo
//! ```
//!
//! Set `METRICS_ADDR=127.0.0.1:9000` to print the Prometheus rendering at the end.

#![allow(missing_docs)]

use basniowa_core::sequence::UniqueIdService;
use basniowa_runtime::metrics::MetricsServer;
use basniowa_runtime::{BufferedIdService, Config, InMemorySequenceProvider, telemetry};
use basniowa_shows::{
    AddShowCommand, AddShowPictureCommand, ShowsApp, ShowsError, UpdateShowCommand,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    telemetry::init_tracing(&config.telemetry.log_level);

    let mut metrics = config.telemetry.metrics_addr.map(MetricsServer::new);
    if let Some(server) = metrics.as_mut() {
        server.start()?;
    }

    tracing::info!(block_size = config.id_service.block_size, "Starting shows demo");

    let ids: Arc<dyn UniqueIdService> = Arc::new(BufferedIdService::from_config(
        InMemorySequenceProvider::new(),
        &config.id_service,
    ));
    let app = ShowsApp::build(ids, &config.dispatch);
    let shows = app.commands();

    let mut properties = BTreeMap::new();
    properties.insert("Czas trwania".to_string(), "45 min".to_string());
    properties.insert("Wiek".to_string(), "4+".to_string());

    let kot = shows
        .add(
            AddShowCommand {
                title: "Kot w butach".into(),
                subtitle: Some("Bajka muzyczna".into()),
                description: "Przygody sprytnego kota i jego pana.".into(),
                properties,
                ..AddShowCommand::default()
            },
            "admin",
        )
        .await?;
    let kapturek = shows
        .add(
            AddShowCommand {
                title: "Czerwony Kapturek".into(),
                description: "Spotkanie z wilkiem w lesie.".into(),
                ..AddShowCommand::default()
            },
            "admin",
        )
        .await?;

    shows
        .update(
            UpdateShowCommand {
                show_id: kot,
                title: "Kot w butach (wznowienie)".into(),
                subtitle: Some("Bajka muzyczna".into()),
                description: "Przygody sprytnego kota i jego pana.".into(),
                ..UpdateShowCommand::default()
            },
            "editor",
        )
        .await?;

    let picture = shows
        .add_picture(
            AddShowPictureCommand {
                show_id: kot,
                file_name: "kot-plakat.jpg".into(),
                ..AddShowPictureCommand::default()
            },
            "editor",
        )
        .await?;
    tracing::info!(show_id = kot, picture_id = picture, "Picture attached");

    shows.delete(kapturek, "admin").await?;

    match shows.delete(kapturek, "admin").await {
        Err(ShowsError::NotFound(err)) => tracing::info!(%err, "Second delete rejected"),
        other => tracing::warn!(?other, "Unexpected outcome of second delete"),
    }

    match shows.add(AddShowCommand::default(), "admin").await {
        Err(ShowsError::Validation(err)) => {
            tracing::info!(%err, "Invalid show rejected before dispatch");
        }
        other => tracing::warn!(?other, "Unexpected outcome of invalid add"),
    }

    println!("Shows:");
    for header in app.reader.get_all_shows().await {
        let details = app.reader.get_show_by_id(header.id).await?;
        println!(
            "  #{} {} | {} | properties: {:?} | pictures: {:?}",
            details.id, details.title, details.description, details.properties, details.pictures
        );
    }

    println!("History:");
    for entry in app.history.entries() {
        println!(
            "  {} show #{} {} by {}",
            entry.occurred_at.format("%H:%M:%S%.3f"),
            entry.show_id,
            entry.action,
            entry.user_name
        );
    }

    if let Some(rendered) = metrics.as_ref().and_then(MetricsServer::render) {
        println!("Metrics:\n{rendered}");
    }

    Ok(())
}

//! Prometheus metrics for dispatch and identifier allocation.
//!
//! # Example
//!
//! ```rust,no_run
//! use basniowa_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder and render handle.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed. An already-installed
    /// recorder (common in tests) is not an error.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!(
                        "Metrics recorder already initialized, skipping re-initialization"
                    );
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Address the server was configured with.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!("dispatch_commands_sent_total", "Commands handled successfully");
    describe_counter!("dispatch_commands_failed_total", "Commands whose handler failed");
    describe_counter!(
        "dispatch_configuration_errors_total",
        "Commands rejected for missing or ambiguous handler bindings"
    );
    describe_histogram!("dispatch_command_duration_seconds", "Time spent handling commands");
    describe_counter!("dispatch_events_published_total", "Events published");
    describe_counter!(
        "dispatch_event_handler_failures_total",
        "Event handler failures contained by the bus"
    );

    describe_counter!("id_service_ids_issued_total", "Identifiers handed out");
    describe_counter!("id_service_refills_total", "Identifier blocks reserved");
    describe_counter!("id_service_refill_failures_total", "Failed block reservations");
    describe_histogram!("id_service_refill_duration_seconds", "Time spent reserving blocks");
}

/// Message bus metrics recorder.
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Record a successfully handled command.
    pub fn record_command(command: &'static str, duration: Duration) {
        counter!("dispatch_commands_sent_total", "command" => command).increment(1);
        histogram!("dispatch_command_duration_seconds", "command" => command)
            .record(duration.as_secs_f64());
    }

    /// Record a command whose handler failed.
    pub fn record_command_failure(command: &'static str) {
        counter!("dispatch_commands_failed_total", "command" => command).increment(1);
    }

    /// Record a missing or ambiguous command binding.
    pub fn record_configuration_error(command: &'static str) {
        counter!("dispatch_configuration_errors_total", "command" => command).increment(1);
    }

    /// Record a published event.
    pub fn record_event(event: &'static str) {
        counter!("dispatch_events_published_total", "event" => event).increment(1);
    }

    /// Record a contained event handler failure.
    pub fn record_event_handler_failure(event: &'static str, handler: &'static str) {
        counter!(
            "dispatch_event_handler_failures_total",
            "event" => event,
            "handler" => handler
        )
        .increment(1);
    }
}

/// Buffered id service metrics recorder.
pub struct IdServiceMetrics;

impl IdServiceMetrics {
    /// Record an identifier handed out.
    pub fn record_issued() {
        counter!("id_service_ids_issued_total").increment(1);
    }

    /// Record a successful block reservation.
    pub fn record_refill(duration: Duration) {
        counter!("id_service_refills_total").increment(1);
        histogram!("id_service_refill_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a failed block reservation.
    pub fn record_refill_failure() {
        counter!("id_service_refill_failures_total").increment(1);
    }
}

//! Runtime configuration.
//!
//! Loads configuration from environment variables with sensible defaults.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `ID_BLOCK_SIZE` | `10` | Identifiers reserved per sequence-provider call |
//! | `EVENT_DISPATCH_MODE` | `inline` | `inline` or `background` |
//! | `LOG_LEVEL` | `info` | Default tracing filter when `RUST_LOG` is unset |
//! | `METRICS_ADDR` | unset | Address reported by the Prometheus exporter |

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Default number of identifiers reserved per refill.
pub const DEFAULT_BLOCK_SIZE: u64 = 10;

/// How event handlers are executed relative to the publish call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventDispatchMode {
    /// Handlers run to completion before `publish` returns
    #[default]
    Inline,
    /// Handlers are spawned onto the tokio runtime; `publish` returns once they are queued
    Background,
}

impl FromStr for EventDispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "background" => Ok(Self::Background),
            other => Err(format!("unknown event dispatch mode: {other}")),
        }
    }
}

impl fmt::Display for EventDispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("inline"),
            Self::Background => f.write_str("background"),
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Message bus configuration
    pub dispatch: DispatchConfig,
    /// Buffered id service configuration
    pub id_service: IdServiceConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

/// Message bus configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Event handler execution mode
    pub event_dispatch_mode: EventDispatchMode,
}

/// Buffered id service configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdServiceConfig {
    /// Identifiers reserved per refill (never zero)
    pub block_size: u64,
}

impl Default for IdServiceConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Metrics address (for Prometheus scraping)
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_addr: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let block_size = match lookup("ID_BLOCK_SIZE").map(|s| s.trim().parse::<u64>()) {
            Some(Ok(0)) => {
                tracing::warn!("ID_BLOCK_SIZE must be positive, using {DEFAULT_BLOCK_SIZE}");
                DEFAULT_BLOCK_SIZE
            }
            Some(Ok(size)) => size,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid ID_BLOCK_SIZE, using {DEFAULT_BLOCK_SIZE}");
                DEFAULT_BLOCK_SIZE
            }
            None => DEFAULT_BLOCK_SIZE,
        };

        let event_dispatch_mode = lookup("EVENT_DISPATCH_MODE")
            .and_then(|s| {
                s.parse()
                    .map_err(|e: String| tracing::warn!(error = %e, "Invalid EVENT_DISPATCH_MODE"))
                    .ok()
            })
            .unwrap_or_default();

        Self {
            dispatch: DispatchConfig {
                event_dispatch_mode,
            },
            id_service: IdServiceConfig { block_size },
            telemetry: TelemetryConfig {
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                metrics_addr: lookup("METRICS_ADDR").and_then(|s| s.parse().ok()),
            },
        }
    }
}

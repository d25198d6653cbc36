//! Tracing subscriber bootstrap.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies to the `basniowa` crates and
/// the demo binary, and everything else logs at `warn`.
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_level: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "warn,basniowa_core={default_level},basniowa_runtime={default_level},\
             basniowa_postgres={default_level},basniowa_shows={default_level},\
             shows_demo={default_level}"
        )
        .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        let _ = init_tracing("debug");
        assert!(!init_tracing("debug"));
    }
}

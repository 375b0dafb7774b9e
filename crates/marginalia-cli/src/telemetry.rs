//! Console tracing for the CLI.
//!
//! Logs go to stderr so rendered markup on stdout stays clean. `RUST_LOG`
//! overrides the default level.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Console log level (default: INFO, DEBUG in debug builds)
    pub console_level: Level,
}

impl TelemetryConfig {
    pub fn from_env(verbose: bool) -> Self {
        let console_level = if verbose || cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };
        Self { console_level }
    }
}

pub fn init(config: TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console_level.as_str().to_lowercase()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry().with(console_layer).init();

    tracing::debug!(level = %config.console_level, "telemetry initialized");
}

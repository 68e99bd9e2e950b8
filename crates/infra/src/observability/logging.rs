//! Tracing subscriber setup

use schedulr_domain::{LoggingConfig, Result, SchedulrError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the configured level.
///
/// An unparsable configured directive degrades to `info`.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. JSON output when `config.json` is set.
///
/// # Errors
/// `Internal` if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| SchedulrError::Internal(format!("tracing already initialized: {e}")))
}

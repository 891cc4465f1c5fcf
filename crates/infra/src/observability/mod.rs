//! Logging setup
//!
//! `RUST_LOG` takes precedence over the configured level. JSON output is
//! meant for log shippers; the default is the human-readable formatter.

use bootnotes_domain::{BootNotesError, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter from `RUST_LOG`, falling back to `level`
fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| BootNotesError::Config(format!("Invalid log level '{level}': {e}"))),
    }
}

/// Install the global tracing subscriber
///
/// Returns `false` when a subscriber was already installed (tests, or an
/// embedding application that set up its own).
///
/// # Errors
/// Returns `BootNotesError::Config` if the configured level is not a valid
/// filter directive.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(false).with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    Ok(installed.is_ok())
}

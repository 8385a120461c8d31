//! Log subscriber setup from [`LoggingConfig`].
//!
//! Step libraries usually run inside a test harness that installs its own
//! subscriber; this is for binaries and test suites that do not.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;
use crate::error::{Result, StepError};

/// Build the filter for a configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| StepError::config(format!("invalid log level '{}': {e}", config.level))),
    }
}

/// Install a global fmt subscriber.
///
/// Fails if the level is invalid or a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter(config)?)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| StepError::config(format!("cannot install log subscriber: {e}")))
}

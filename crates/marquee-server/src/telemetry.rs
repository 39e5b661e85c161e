//! Tracing subscriber setup.

use marquee_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
///
/// # Errors
///
/// Returns [`StartupError::Logging`] if the filter is invalid or a
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| StartupError::Logging {
            message: format!("invalid log filter {:?}: {e}", config.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| StartupError::Logging {
        message: e.to_string(),
    })
}

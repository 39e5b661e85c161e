//! Marquee service binary.
//!
//! Wires together configuration, the movie store, startup seeding, the
//! stream composer, and the HTTP API, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$MARQUEE_CONFIG` or `marquee-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured movie store
//! 4. Wipe and seed the collection (when enabled)
//! 5. Build the stream composer with the configured tick interval
//! 6. Bind the listener and serve until shutdown
//! 7. Close the store connection

mod backend;
mod error;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use marquee_api::{AppState, ServerConfig};
use marquee_core::StreamComposer;
use marquee_core::config::ServiceConfig;
use tracing::{info, warn};

use crate::error::StartupError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "marquee-config.yaml";

/// Environment variable naming an alternative configuration file.
const CONFIG_PATH_VAR: &str = "MARQUEE_CONFIG";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails or the server stops
/// abnormally.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("loading configuration")?;
    telemetry::init(&config.logging)?;

    info!("marquee-server starting");
    info!(
        backend = ?config.store.backend,
        port = config.server.port,
        tick_interval_ms = config.stream.tick_interval_ms,
        seed = config.seed.enabled,
        "Configuration loaded"
    );

    let (store, connection) = backend::open(&config.store)
        .await
        .context("opening movie store")?;

    if config.seed.enabled {
        marquee_db::seed_movies(store.as_ref(), &config.seed.titles)
            .await
            .map_err(StartupError::from)
            .context("seeding movies")?;
    }

    let composer = Arc::new(
        StreamComposer::new(Arc::clone(&store), config.stream.tick_interval())
            .map_err(StartupError::from)?,
    );
    info!(
        period_ms = u64::try_from(composer.period().as_millis()).unwrap_or(u64::MAX),
        "Stream composer ready"
    );
    let state = Arc::new(AppState::new(composer).with_keep_alive(config.stream.keep_alive()));

    let listener = marquee_api::bind(&ServerConfig::from(&config.server))
        .await
        .map_err(StartupError::from)?;
    let served = marquee_api::serve(listener, state, shutdown_signal())
        .await
        .map_err(StartupError::from);

    connection.close().await;
    served?;

    info!("marquee-server shutdown complete");
    Ok(())
}

/// Resolve and load the configuration file.
///
/// A missing file is not an error: defaults are used, with environment
/// overrides still applied.
fn load_config() -> Result<ServiceConfig, StartupError> {
    let path = std::env::var_os(CONFIG_PATH_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        Ok(ServiceConfig::from_file(&path)?)
    } else {
        Ok(ServiceConfig::parse("")?)
    }
}

/// Resolve once the process receives `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
}

//! Error types for the Marquee server binary.
//!
//! [`StartupError`] is the top-level error type that wraps all possible
//! failure modes between process start and the server accepting requests.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that startup code can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: marquee_core::config::ConfigError,
    },

    /// A store backend could not be opened.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: marquee_db::DbError,
    },

    /// Seeding the collection failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: marquee_core::StoreError,
    },

    /// The stream composer rejected its pacing period.
    #[error("stream error: {source}")]
    Stream {
        /// The underlying pacing error.
        #[from]
        source: marquee_core::TickGateError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: marquee_api::ServerError,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}

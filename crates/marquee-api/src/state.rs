//! Shared application state for the API server.

use std::sync::Arc;
use std::time::Duration;

use marquee_core::{MovieStore, StreamComposer};

/// Default interval between SSE keep-alive comments.
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The store
/// is the same one the composer resolves streams against.
#[derive(Clone)]
pub struct AppState {
    /// Read access to the movie collection.
    pub store: Arc<dyn MovieStore>,
    /// Opens paced event streams.
    pub composer: Arc<StreamComposer>,
    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,
}

impl AppState {
    /// Create application state around a composer and its store.
    pub fn new(composer: Arc<StreamComposer>) -> Self {
        Self {
            store: Arc::clone(composer.store()),
            composer,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    /// Override the SSE keep-alive interval.
    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

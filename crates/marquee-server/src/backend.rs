//! Store backend selection.
//!
//! Turns the `store` config section into a shared [`MovieStore`]. Backends
//! that own a connection are returned alongside a handle so `main` can
//! close them on the way out.

use std::sync::Arc;

use marquee_core::config::{StoreBackend, StoreConfig};
use marquee_core::{MemoryStore, MovieStore};
use marquee_db::{DragonflyPool, PostgresConfig, PostgresPool};
use tracing::info;

use crate::error::StartupError;

/// Connection owned by the selected backend.
pub enum Connection {
    /// Nothing to close.
    None,
    /// `PostgreSQL` pool.
    Postgres(PostgresPool),
    /// `Dragonfly` client.
    Dragonfly(DragonflyPool),
}

impl Connection {
    /// Close the underlying connection, if any.
    pub async fn close(self) {
        match self {
            Self::None => {}
            Self::Postgres(pool) => pool.close().await,
            Self::Dragonfly(pool) => {
                if let Err(e) = pool.close().await {
                    tracing::warn!(error = %e, "Failed to close Dragonfly connection");
                }
            }
        }
    }
}

/// Open the configured backend.
///
/// `PostgreSQL` migrations run before the store is handed out.
///
/// # Errors
///
/// Returns [`StartupError::Database`] if the backend cannot be reached or
/// migrated.
pub async fn open(config: &StoreConfig) -> Result<(Arc<dyn MovieStore>, Connection), StartupError> {
    info!(backend = ?config.backend, "Opening movie store");
    match config.backend {
        StoreBackend::Memory => Ok((Arc::new(MemoryStore::new()), Connection::None)),
        StoreBackend::Postgres => {
            let pool = PostgresPool::connect(&PostgresConfig::from_store_config(config)).await?;
            pool.run_migrations().await?;
            Ok((Arc::new(pool.movie_store()), Connection::Postgres(pool)))
        }
        StoreBackend::Dragonfly => {
            let pool = DragonflyPool::connect(&config.dragonfly_url).await?;
            Ok((Arc::new(pool.movie_store()), Connection::Dragonfly(pool)))
        }
    }
}

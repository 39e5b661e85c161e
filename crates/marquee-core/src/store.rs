//! The document store contract consumed by the streaming core.
//!
//! [`MovieStore`] is deliberately narrow: two read operations used by the
//! HTTP surface and the stream composer, plus the two write operations the
//! startup seed step needs. Backends live in `marquee-db`; the in-memory
//! [`MemoryStore`] defined here backs tests and store-less deployments.

use std::collections::BTreeMap;

use async_trait::async_trait;
use marquee_types::{Movie, MovieId};
use tokio::sync::RwLock;

/// Errors a store backend can report.
///
/// An absent document is not an error: lookups return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or failed while serving the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be decoded.
    #[error("corrupt document {id}: {reason}")]
    Corrupt {
        /// Identifier of the offending document.
        id: String,
        /// Decoder error message.
        reason: String,
    },
}

/// Asynchronous access to the movie collection.
///
/// Implementations are shared across requests behind an [`Arc`] and must
/// do their own synchronization.
///
/// [`Arc`]: std::sync::Arc
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// List every movie in the collection. Ordering is backend-defined.
    async fn find_all(&self) -> Result<Vec<Movie>, StoreError>;

    /// Look up a single movie by identifier.
    async fn find_by_id(&self, id: &MovieId) -> Result<Option<Movie>, StoreError>;

    /// Insert or replace a movie, keyed by its identifier.
    async fn save(&self, movie: &Movie) -> Result<(), StoreError>;

    /// Remove every movie from the collection.
    async fn delete_all(&self) -> Result<(), StoreError>;
}

/// In-memory [`MovieStore`] backed by an ordered map.
///
/// Listing order is identifier order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    movies: RwLock<BTreeMap<MovieId, Movie>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `movies`.
    ///
    /// Later entries replace earlier ones with the same identifier.
    pub fn with_movies(movies: impl IntoIterator<Item = Movie>) -> Self {
        let map = movies
            .into_iter()
            .map(|movie| (movie.id.clone(), movie))
            .collect();
        Self {
            movies: RwLock::new(map),
        }
    }

    /// Number of stored movies.
    pub async fn len(&self) -> usize {
        self.movies.read().await.len()
    }

    /// Whether the store holds no movies.
    pub async fn is_empty(&self) -> bool {
        self.movies.read().await.is_empty()
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Movie>, StoreError> {
        Ok(self.movies.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &MovieId) -> Result<Option<Movie>, StoreError> {
        Ok(self.movies.read().await.get(id).cloned())
    }

    async fn save(&self, movie: &Movie) -> Result<(), StoreError> {
        self.movies
            .write()
            .await
            .insert(movie.id.clone(), movie.clone());
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.movies.write().await.clear();
        Ok(())
    }
}

//! `Dragonfly` (Redis-compatible) document storage for movies.
//!
//! Movies are kept as JSON documents in a single hash, one field per
//! identifier.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `movies` | Hash | `{id}` -> JSON-encoded [`Movie`] |

use std::collections::HashMap;

use async_trait::async_trait;
use fred::prelude::*;
use marquee_core::{MovieStore, StoreError};
use marquee_types::{Movie, MovieId};

use crate::error::DbError;

/// Hash holding every movie document.
pub const MOVIES_KEY: &str = "movies";

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// A [`DragonflyMovieStore`] sharing this connection.
    pub fn movie_store(&self) -> DragonflyMovieStore {
        DragonflyMovieStore {
            pool: self.clone(),
        }
    }

    /// Store a movie document under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if encoding fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn put_movie(&self, movie: &Movie) -> Result<(), DbError> {
        let json = serde_json::to_string(movie)?;
        let _: i64 = self
            .client
            .hset(MOVIES_KEY, (movie.id.as_str(), json.as_str()))
            .await?;
        Ok(())
    }

    /// Read the raw JSON document for `id`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_movie_json(&self, id: &MovieId) -> Result<Option<String>, DbError> {
        let value: Option<String> = self.client.hget(MOVIES_KEY, id.as_str()).await?;
        Ok(value)
    }

    /// Read every raw JSON document, keyed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn all_movie_json(&self) -> Result<HashMap<String, String>, DbError> {
        let values: HashMap<String, String> = self.client.hgetall(MOVIES_KEY).await?;
        Ok(values)
    }

    /// Delete the whole movie hash.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn clear_movies(&self) -> Result<(), DbError> {
        let _: u32 = self.client.del(MOVIES_KEY).await?;
        Ok(())
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the quit command fails.
    pub async fn close(&self) -> Result<(), DbError> {
        self.client.quit().await?;
        tracing::info!("Dragonfly connection closed");
        Ok(())
    }
}

/// [`MovieStore`] over a `Dragonfly` hash.
#[derive(Clone)]
pub struct DragonflyMovieStore {
    pool: DragonflyPool,
}

#[async_trait]
impl MovieStore for DragonflyMovieStore {
    async fn find_all(&self) -> Result<Vec<Movie>, StoreError> {
        let docs = self.pool.all_movie_json().await?;
        let mut movies = docs
            .iter()
            .map(|(id, json)| decode(id, json))
            .collect::<Result<Vec<_>, _>>()?;
        movies.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(movies)
    }

    async fn find_by_id(&self, id: &MovieId) -> Result<Option<Movie>, StoreError> {
        self.pool
            .get_movie_json(id)
            .await?
            .map(|json| decode(id.as_str(), &json))
            .transpose()
    }

    async fn save(&self, movie: &Movie) -> Result<(), StoreError> {
        self.pool.put_movie(movie).await?;
        tracing::debug!(movie_id = %movie.id, "Saved movie");
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.pool.clear_movies().await?;
        Ok(())
    }
}

/// Decode one stored document.
fn decode(id: &str, json: &str) -> Result<Movie, StoreError> {
    serde_json::from_str(json).map_err(|e| StoreError::Corrupt {
        id: id.to_owned(),
        reason: e.to_string(),
    })
}

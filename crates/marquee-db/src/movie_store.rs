//! `movies` table operations behind the [`MovieStore`] trait.
//!
//! Queries are parameterized and built at runtime. Listing is ordered by
//! identifier so repeated reads are stable.

use async_trait::async_trait;
use marquee_core::{MovieStore, StoreError};
use marquee_types::{Movie, MovieId};
use sqlx::PgPool;

use crate::error::DbError;

/// A row from the `movies` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MovieRow {
    /// Document identifier (primary key).
    pub id: String,
    /// Display title.
    pub title: String,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Self::new(row.id, row.title)
    }
}

/// [`MovieStore`] over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PostgresMovieStore {
    pool: PgPool,
}

impl PostgresMovieStore {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self) -> Result<Vec<MovieRow>, DbError> {
        let rows = sqlx::query_as::<_, MovieRow>("SELECT id, title FROM movies ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_one(&self, id: &MovieId) -> Result<Option<MovieRow>, DbError> {
        let row = sqlx::query_as::<_, MovieRow>("SELECT id, title FROM movies WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert(&self, movie: &Movie) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO movies (id, title) VALUES ($1, $2)
              ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title",
        )
        .bind(movie.id.as_str())
        .bind(&movie.title)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn truncate(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM movies").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl MovieStore for PostgresMovieStore {
    async fn find_all(&self) -> Result<Vec<Movie>, StoreError> {
        let rows = self.fetch_all().await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn find_by_id(&self, id: &MovieId) -> Result<Option<Movie>, StoreError> {
        Ok(self.fetch_one(id).await?.map(Movie::from))
    }

    async fn save(&self, movie: &Movie) -> Result<(), StoreError> {
        self.upsert(movie).await?;
        tracing::debug!(movie_id = %movie.id, "Saved movie");
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let removed = self.truncate().await?;
        tracing::debug!(removed, "Cleared movies table");
        Ok(())
    }
}

//! Startup seeding of the movie collection.
//!
//! Seeding wipes the collection and inserts one movie per title, each
//! with a freshly generated identifier.

use marquee_core::{MovieStore, StoreError};
use marquee_types::Movie;

/// Replace the contents of `store` with one movie per entry in `titles`.
///
/// Returns the inserted movies in title order.
///
/// # Errors
///
/// Returns the first [`StoreError`] hit while clearing or inserting. Movies
/// saved before the failure stay in the store.
pub async fn seed_movies<S>(store: &S, titles: &[String]) -> Result<Vec<Movie>, StoreError>
where
    S: MovieStore + ?Sized,
{
    store.delete_all().await?;

    let mut saved = Vec::with_capacity(titles.len());
    for title in titles {
        let movie = Movie::with_generated_id(title.as_str());
        store.save(&movie).await?;
        tracing::info!(movie_id = %movie.id, title = %movie.title, "Seeded movie");
        saved.push(movie);
    }

    tracing::info!(count = saved.len(), "Movie collection seeded");
    Ok(saved)
}

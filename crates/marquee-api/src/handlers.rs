//! REST endpoint handlers for the movie collection.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/movies` | List all movies (JSON array or NDJSON) |
//! | `GET` | `/movies/{id}` | Get a single movie |
//! | `GET` | `/health` | Liveness plus open stream count |

use std::sync::Arc;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use marquee_types::{Movie, MovieId};

use crate::error::ApiError;
use crate::state::AppState;

/// Media type for newline-delimited JSON listings.
pub const NDJSON: &str = "application/x-ndjson";

// ---------------------------------------------------------------------------
// GET /movies -- list movies
// ---------------------------------------------------------------------------

/// List every movie in the collection.
///
/// Responds with a JSON array by default. Clients that send
/// `Accept: application/x-ndjson` get one JSON record per line instead,
/// streamed as it is encoded.
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let movies = state.store.find_all().await?;
    tracing::debug!(count = movies.len(), "Listed movies");

    if wants_ndjson(&headers) {
        return Ok(ndjson_response(movies));
    }
    Ok(Json(movies).into_response())
}

fn wants_ndjson(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|media| media.trim().starts_with(NDJSON))
}

fn ndjson_response(movies: Vec<Movie>) -> Response {
    let lines = tokio_stream::iter(movies.into_iter().map(|movie| {
        serde_json::to_vec(&movie).map(|mut line| {
            line.push(b'\n');
            Bytes::from(line)
        })
    }));

    let mut response = Body::from_stream(lines).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(NDJSON));
    response
}

// ---------------------------------------------------------------------------
// GET /movies/{id} -- single movie
// ---------------------------------------------------------------------------

/// Return a single movie, or 404 if the id is unknown.
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    let id = MovieId::from(id);
    let movie = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("movie {id}")))?;
    Ok(Json(movie))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness and the number of event streams currently open.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "active_streams": state.composer.active_streams(),
    }))
}

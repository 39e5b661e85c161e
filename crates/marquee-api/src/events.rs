//! Server-sent events handler for live movie streams.
//!
//! Clients connect to `GET /movies/{id}/events` and receive one `movie`
//! event per tick, each carrying a JSON-encoded [`MovieEvent`]. The movie
//! is resolved before the response starts, so an unknown id is a plain 404.
//!
//! When the client disconnects, Axum drops the response body, which drops
//! the underlying [`EventStream`] and stops its producer.
//!
//! [`EventStream`]: marquee_core::EventStream

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use marquee_types::{MovieEvent, MovieId};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// SSE event name for movie frames.
pub const MOVIE_EVENT: &str = "movie";

/// Open a paced event stream for one movie.
///
/// # Route
///
/// `GET /movies/{id}/events`
pub async fn movie_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let id = MovieId::from(id);
    let stream = state.composer.open_stream(&id).await?;

    let mut session = Session::new(id);
    let frames = stream.map_while(move |event| session.frame(&event));

    Ok(Sse::new(frames).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}

/// Per-connection bookkeeping. Logs once when the client goes away.
#[derive(Debug)]
struct Session {
    movie_id: MovieId,
    sent: u64,
}

impl Session {
    const fn new(movie_id: MovieId) -> Self {
        Self { movie_id, sent: 0 }
    }

    /// Encode one event. `None` ends the stream.
    fn frame(&mut self, event: &MovieEvent) -> Option<Result<Event, Infallible>> {
        match Event::default().event(MOVIE_EVENT).json_data(event) {
            Ok(frame) => {
                self.sent = self.sent.saturating_add(1);
                Some(Ok(frame))
            }
            Err(e) => {
                warn!(movie_id = %self.movie_id, error = %e, "Failed to encode movie event, closing stream");
                None
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(movie_id = %self.movie_id, sent = self.sent, "Event stream client disconnected");
    }
}

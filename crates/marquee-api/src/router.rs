//! Axum router construction for the Marquee API.
//!
//! Assembles all routes (REST + SSE) into a single [`Router`] with CORS
//! middleware enabled for cross-origin clients.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::events;
use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /movies` -- list movies
/// - `GET /movies/{id}` -- single movie
/// - `GET /movies/{id}/events` -- server-sent event stream for one movie
/// - `GET /health` -- liveness and open stream count
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/movies", get(handlers::list_movies))
        .route("/movies/{id}", get(handlers::get_movie))
        .route("/movies/{id}/events", get(events::movie_events))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

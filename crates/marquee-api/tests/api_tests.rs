//! Integration tests for the Marquee API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use marquee_api::router::build_router;
use marquee_api::state::AppState;
use marquee_core::{MemoryStore, MovieStore, StoreError, StreamComposer};
use marquee_types::{Movie, MovieId};
use serde_json::Value;
use tokio_stream::StreamExt;
use tower::ServiceExt;

const PERIOD: Duration = Duration::from_secs(1);

fn catalogue() -> Vec<Movie> {
    vec![
        Movie::new("a1", "some title "),
        Movie::new("a2", "some movie title"),
        Movie::new("a3", "don2"),
        Movie::new("a4", "mi7"),
        Movie::new("a5", "dom2"),
    ]
}

fn make_state(store: Arc<dyn MovieStore>) -> Arc<AppState> {
    let composer = Arc::new(StreamComposer::new(store, PERIOD).unwrap());
    Arc::new(AppState::new(composer))
}

fn make_router() -> (Router, Arc<AppState>) {
    let state = make_state(Arc::new(MemoryStore::with_movies(catalogue())));
    (build_router(Arc::clone(&state)), state)
}

async fn get(router: &Router, uri: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

struct BrokenStore;

#[async_trait]
impl MovieStore for BrokenStore {
    async fn find_all(&self) -> Result<Vec<Movie>, StoreError> {
        Err(StoreError::Unavailable(String::from("connection refused")))
    }
    async fn find_by_id(&self, _id: &MovieId) -> Result<Option<Movie>, StoreError> {
        Err(StoreError::Unavailable(String::from("connection refused")))
    }
    async fn save(&self, _movie: &Movie) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(String::from("connection refused")))
    }
    async fn delete_all(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(String::from("connection refused")))
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_list_movies() {
    let (router, _) = make_router();
    let response = get(&router, "/movies").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let movies = json.as_array().unwrap();
    assert_eq!(movies.len(), 5);
    assert_eq!(movies[2]["title"], "don2");
}

#[tokio::test]
async fn test_list_movies_empty_store() {
    let state = make_state(Arc::new(MemoryStore::new()));
    let router = build_router(state);
    let response = get(&router, "/movies").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_list_movies_ndjson() {
    let (router, _) = make_router();
    let response = router
        .clone()
        .oneshot(
            Request::get("/movies")
                .header(header::ACCEPT, "application/x-ndjson")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/x-ndjson"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<Movie> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines, catalogue());
}

#[tokio::test]
async fn test_get_movie_by_id() {
    let (router, _) = make_router();
    let response = get(&router, "/movies/a4").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], "a4");
    assert_eq!(json["title"], "mi7");
}

#[tokio::test]
async fn test_get_movie_not_found() {
    let (router, _) = make_router();
    let response = get(&router, "/movies/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_store_failure_is_service_unavailable() {
    let router = build_router(make_state(Arc::new(BrokenStore)));

    for uri in ["/movies", "/movies/a1", "/movies/a1/events"] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
    }
}

#[tokio::test]
async fn test_events_unknown_movie_is_404() {
    let (router, state) = make_router();
    let response = get(&router, "/movies/nope/events").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.composer.active_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_events_stream_movie_frames() {
    let (router, state) = make_router();
    let response = get(&router, "/movies/a3/events").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));
    assert_eq!(state.composer.active_streams(), 1);

    let mut body = response.into_body().into_data_stream();
    let chunk = body.next().await.unwrap().unwrap();
    let frame = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(frame.contains("event: movie"), "{frame}");

    let data = frame
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let json: Value = serde_json::from_str(data).unwrap();
    assert_eq!(json["movie"]["id"], "a3");
    assert_eq!(json["movie"]["title"], "don2");
    assert!(json["when"].is_string());
}

#[tokio::test(start_paused = true)]
async fn test_events_end_on_shutdown() {
    let (router, state) = make_router();
    let response = get(&router, "/movies/a1/events").await;
    assert_eq!(response.status(), StatusCode::OK);

    state.composer.shutdown();

    let mut body = response.into_body().into_data_stream();
    while let Some(chunk) = body.next().await {
        let frame = String::from_utf8(chunk.unwrap().to_vec()).unwrap();
        assert!(!frame.contains("event: movie"), "{frame}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_health_reports_active_streams() {
    let (router, _) = make_router();
    let response = get(&router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_streams"], 0);

    let stream = get(&router, "/movies/a1/events").await;
    let json = body_to_json(get(&router, "/health").await.into_body()).await;
    assert_eq!(json["active_streams"], 1);

    // Dropping the response body is how a client disconnect reaches us.
    drop(stream);
    tokio::time::sleep(PERIOD).await;
    let json = body_to_json(get(&router, "/health").await.into_body()).await;
    assert_eq!(json["active_streams"], 0);
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let (router, _) = make_router();
    let response = get(&router, "/api/nonexistent").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//! HTTP API for the Marquee movie service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for reading the movie collection
//!   (`GET /movies`, `GET /movies/{id}`)
//! - **Server-sent events** (`GET /movies/{id}/events`) carrying one
//!   [`MovieEvent`] per tick for a single movie, for as long as the client
//!   stays connected
//! - **Health** (`GET /health`) with the number of live streams
//!
//! # Architecture
//!
//! Handlers share an [`AppState`] holding the [`MovieStore`] and the
//! [`StreamComposer`]. Store failures and unknown ids are turned into
//! status codes before any response body is written; once an event stream
//! has started it can only end, never turn into an error response.
//!
//! [`MovieEvent`]: marquee_types::MovieEvent
//! [`MovieStore`]: marquee_core::MovieStore
//! [`StreamComposer`]: marquee_core::StreamComposer

pub mod error;
pub mod events;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, serve};
pub use state::AppState;

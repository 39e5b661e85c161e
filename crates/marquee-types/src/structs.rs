//! Core record structs: the stored movie document and its stream event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::MovieId;

// ---------------------------------------------------------------------------
// Movie
// ---------------------------------------------------------------------------

/// A movie document as held by the store.
///
/// Identity is the [`MovieId`]; the remaining fields are plain scalars.
/// Documents are written by the seed step (or any external writer) and are
/// read-only from the point of view of the streaming core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Movie {
    /// Unique document identifier.
    pub id: MovieId,
    /// Display title.
    pub title: String,
}

impl Movie {
    /// Build a movie from an identifier and a title.
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Build a movie with a freshly generated identifier.
    pub fn with_generated_id(title: impl Into<String>) -> Self {
        Self::new(MovieId::generate(), title)
    }
}

// ---------------------------------------------------------------------------
// MovieEvent
// ---------------------------------------------------------------------------

/// A timestamped snapshot of a [`Movie`], emitted once per stream tick.
///
/// Events are created fresh for every emission and never persisted. The
/// embedded movie is the snapshot resolved when the stream was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MovieEvent {
    /// The movie this event describes.
    pub movie: Movie,
    /// Wall-clock time at which the event was produced.
    pub when: DateTime<Utc>,
}

impl MovieEvent {
    /// Pair a movie snapshot with an emission timestamp.
    pub const fn new(movie: Movie, when: DateTime<Utc>) -> Self {
        Self { movie, when }
    }
}

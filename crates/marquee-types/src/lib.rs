//! Shared type definitions for the Marquee movie service.
//!
//! This crate is the single source of truth for the records that cross
//! crate boundaries: the stored movie document and the timestamped event
//! pushed over the live stream. Types flow downstream to `TypeScript` via
//! `ts-rs` for dashboard consumers.
//!
//! # Modules
//!
//! - [`ids`] -- String identifier wrapper for movie documents
//! - [`structs`] -- The [`Movie`] document and [`MovieEvent`] stream payload

pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::MovieId;
pub use structs::{Movie, MovieEvent};

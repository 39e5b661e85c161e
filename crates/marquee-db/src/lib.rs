//! Store backends for the Marquee movie service (`PostgreSQL` + `Dragonfly`).
//!
//! Both backends implement [`marquee_core::MovieStore`], so the HTTP layer
//! and the stream composer never see which one is in use. The binary picks
//! one from configuration at startup.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`movie_store`] -- `movies` table queries behind [`PostgresMovieStore`]
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) document hash
//! - [`seed`] -- Wipe-and-insert startup seeding
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod movie_store;
pub mod postgres;
pub mod seed;

// Re-export primary types for convenience.
pub use dragonfly::{DragonflyMovieStore, DragonflyPool};
pub use error::DbError;
pub use movie_store::{MovieRow, PostgresMovieStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use seed::seed_movies;

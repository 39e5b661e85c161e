//! Infinite generator of timestamped movie events.
//!
//! [`EventSequence`] is an [`Iterator`] that never ends: every call to
//! `next` wraps the same movie snapshot with a freshly captured timestamp.
//! Termination is always the consumer's decision.

use std::iter::FusedIterator;

use chrono::{DateTime, Utc};
use marquee_types::{Movie, MovieEvent};

/// Source of "now" for event timestamps.
pub type SystemClock = fn() -> DateTime<Utc>;

/// Lazy, unbounded sequence of [`MovieEvent`] values for one movie.
///
/// The timestamp is read from the clock when an element is pulled, not
/// when the sequence is built.
#[derive(Debug, Clone)]
pub struct EventSequence<C = SystemClock> {
    movie: Movie,
    clock: C,
    produced: u64,
}

impl EventSequence {
    /// Create a sequence stamped with the system wall clock.
    pub fn new(movie: Movie) -> Self {
        Self::with_clock(movie, Utc::now as SystemClock)
    }
}

impl<C> EventSequence<C>
where
    C: FnMut() -> DateTime<Utc>,
{
    /// Create a sequence stamped by a caller-supplied clock.
    pub const fn with_clock(movie: Movie, clock: C) -> Self {
        Self {
            movie,
            clock,
            produced: 0,
        }
    }

    /// The movie every event in this sequence carries.
    pub const fn movie(&self) -> &Movie {
        &self.movie
    }

    /// Number of events pulled so far.
    pub const fn produced(&self) -> u64 {
        self.produced
    }
}

impl<C> Iterator for EventSequence<C>
where
    C: FnMut() -> DateTime<Utc>,
{
    type Item = MovieEvent;

    fn next(&mut self) -> Option<MovieEvent> {
        self.produced = self.produced.saturating_add(1);
        Some(MovieEvent::new(self.movie.clone(), (self.clock)()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<C> FusedIterator for EventSequence<C> where C: FnMut() -> DateTime<Utc> {}

//! Paced event streams for a single movie.
//!
//! [`StreamComposer::open_stream`] resolves a movie once, then spawns a
//! producer task that pairs each [`TickGate`] tick with the next element of
//! an [`EventSequence`]. Element N is emitted only after tick N has fired,
//! so the stream runs at one event per period no matter how fast the
//! generator could go.
//!
//! # Backpressure and cancellation
//!
//! The producer hands events to the consumer through a channel with a
//! single slot. While the slot is occupied the producer waits and the gate
//! delays its ticks instead of queueing them. Once the slot frees, the event
//! is stamped and sent, and the gate's period restarts from that moment, so
//! consecutive events are always at least one period apart.
//!
//! A stream ends when any of the following happens:
//!
//! - the consumer drops the [`EventStream`] (the producer task is aborted),
//! - the receiving side of the channel closes,
//! - [`StreamComposer::shutdown`] is called.
//!
//! None of these are errors. Nothing keeps ticking after the stream is gone.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;
use marquee_types::{MovieEvent, MovieId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sequence::EventSequence;
use crate::store::{MovieStore, StoreError};
use crate::tick_gate::{self, TickGate, TickGateError};

/// Capacity of the producer-to-consumer handoff.
const HANDOFF_CAPACITY: usize = 1;

/// Shared source of event timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Errors that prevent a stream from opening.
///
/// All of them are reported before the first event, so callers can still
/// answer with a plain status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// No movie exists with the requested identifier.
    #[error("movie not found: {0}")]
    NotFound(MovieId),

    /// The store failed while resolving the movie.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] StoreError),

    /// The pacing timer could not be created.
    #[error("timer error: {0}")]
    Timer(#[from] TickGateError),
}

/// Builds paced [`EventStream`]s backed by a shared [`MovieStore`].
pub struct StreamComposer {
    store: Arc<dyn MovieStore>,
    period: Duration,
    clock: Clock,
    shutdown: watch::Sender<bool>,
    active: Arc<AtomicUsize>,
}

impl StreamComposer {
    /// Create a composer that emits one event per `period`.
    ///
    /// # Errors
    ///
    /// Returns [`TickGateError::ZeroPeriod`] if `period` is zero.
    pub fn new(store: Arc<dyn MovieStore>, period: Duration) -> Result<Self, TickGateError> {
        Self::with_clock(store, period, Arc::new(Utc::now))
    }

    /// Create a composer whose events are stamped by `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`TickGateError::ZeroPeriod`] if `period` is zero.
    pub fn with_clock(
        store: Arc<dyn MovieStore>,
        period: Duration,
        clock: Clock,
    ) -> Result<Self, TickGateError> {
        tick_gate::validate_period(period)?;
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            store,
            period,
            clock,
            shutdown,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The store this composer resolves movies against.
    pub fn store(&self) -> &Arc<dyn MovieStore> {
        &self.store
    }

    /// The tick period of every stream this composer opens.
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Number of producer tasks currently running.
    pub fn active_streams(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Ask every open stream to finish.
    ///
    /// Streams end at their next suspension point. Streams opened after
    /// this call end immediately without emitting.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        info!(
            active_streams = self.active_streams(),
            "Event streams shutting down"
        );
    }

    /// Open a paced event stream for `movie_id`.
    ///
    /// Performs exactly one store lookup. The timer and producer task are
    /// only started once the movie has been resolved; the resolved snapshot
    /// is embedded in every event for the lifetime of the stream.
    ///
    /// # Errors
    ///
    /// - [`StreamError::NotFound`] if the store has no such movie.
    /// - [`StreamError::UpstreamUnavailable`] if the lookup failed.
    /// - [`StreamError::Timer`] if the tick gate could not be created.
    pub async fn open_stream(&self, movie_id: &MovieId) -> Result<EventStream, StreamError> {
        let movie = match self.store.find_by_id(movie_id).await {
            Ok(Some(movie)) => movie,
            Ok(None) => {
                debug!(%movie_id, "Stream requested for unknown movie");
                return Err(StreamError::NotFound(movie_id.clone()));
            }
            Err(e) => {
                warn!(%movie_id, error = %e, "Movie lookup failed, stream not opened");
                return Err(StreamError::UpstreamUnavailable(e));
            }
        };

        let gate = TickGate::new(self.period)?;
        let clock = Arc::clone(&self.clock);
        let events = EventSequence::with_clock(movie, move || clock());
        let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
        let guard = ActiveGuard::acquire(Arc::clone(&self.active));
        let shutdown = self.shutdown.subscribe();

        info!(
            %movie_id,
            period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX),
            active_streams = self.active_streams(),
            "Event stream opened"
        );

        let task = tokio::spawn(produce(gate, events, tx, shutdown, guard));

        Ok(EventStream { rx, task })
    }
}

/// A live, paced stream of [`MovieEvent`] values.
///
/// Yields `None` only after the producer stopped (shutdown). Dropping the
/// stream cancels the producer.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<MovieEvent>,
    task: JoinHandle<()>,
}

impl EventStream {
    /// Receive the next event, waiting for its tick.
    pub async fn next_event(&mut self) -> Option<MovieEvent> {
        self.rx.recv().await
    }
}

impl Stream for EventStream {
    type Item = MovieEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<MovieEvent>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Why a producer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    ConsumerGone,
    Shutdown,
}

/// Producer loop: wait for a tick, wait for the slot, pull, hand off.
///
/// When the slot was still full at tick time the gate is reset after the
/// handoff, so the next event waits a full period.
async fn produce<C>(
    mut gate: TickGate,
    mut events: EventSequence<C>,
    tx: mpsc::Sender<MovieEvent>,
    mut shutdown: watch::Receiver<bool>,
    _guard: ActiveGuard,
) where
    C: FnMut() -> DateTime<Utc>,
{
    let movie_id = events.movie().id.clone();

    let reason = loop {
        let tick = tokio::select! {
            tick = gate.tick() => tick,
            () = tx.closed() => break StopReason::ConsumerGone,
            () = shutdown_requested(&mut shutdown) => break StopReason::Shutdown,
        };

        let (permit, waited) = match tx.try_reserve() {
            Ok(permit) => (permit, false),
            Err(TrySendError::Closed(())) => break StopReason::ConsumerGone,
            Err(TrySendError::Full(())) => tokio::select! {
                permit = tx.reserve() => match permit {
                    Ok(permit) => (permit, true),
                    Err(_closed) => break StopReason::ConsumerGone,
                },
                () = shutdown_requested(&mut shutdown) => break StopReason::Shutdown,
            },
        };

        let Some(event) = events.next() else {
            break StopReason::ConsumerGone;
        };
        permit.send(event);
        if waited {
            gate.reset();
        }
        debug!(%movie_id, ordinal = tick.ordinal(), waited, "Event emitted");
    };

    debug!(
        %movie_id,
        ?reason,
        ticks = gate.ticks_delivered(),
        events = events.produced(),
        "Event stream closed"
    );
}

/// Resolve once shutdown has been requested.
///
/// If the composer is gone no shutdown can ever arrive, so this never
/// resolves in that case.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let requested = rx.wait_for(|stop| *stop).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

/// Counts a running producer for as long as it is alive.
#[derive(Debug)]
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn acquire(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use futures::StreamExt;
    use marquee_types::Movie;
    use tokio::time::Instant;

    use super::*;
    use crate::store::MemoryStore;

    const PERIOD: Duration = Duration::from_secs(1);

    /// Clock that follows Tokio's (pausable) time so tests can check spacing.
    fn tokio_clock() -> Clock {
        let base = Utc::now();
        let start = Instant::now();
        Arc::new(move || base + TimeDelta::from_std(start.elapsed()).unwrap_or_default())
    }

    fn composer_with(store: Arc<dyn MovieStore>) -> StreamComposer {
        match StreamComposer::with_clock(store, PERIOD, tokio_clock()) {
            Ok(composer) => composer,
            Err(e) => panic!("composer construction failed: {e}"),
        }
    }

    fn seeded() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_movies([Movie::new("m1", "Don 2")]))
    }

    async fn open(composer: &StreamComposer, id: &str) -> EventStream {
        match composer.open_stream(&MovieId::from(id)).await {
            Ok(stream) => stream,
            Err(e) => panic!("stream did not open: {e}"),
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl MovieStore for BrokenStore {
        async fn find_all(&self) -> Result<Vec<Movie>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }
        async fn find_by_id(&self, _id: &MovieId) -> Result<Option<Movie>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }
        async fn save(&self, _movie: &Movie) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }
        async fn delete_all(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }
    }

    #[test]
    fn zero_period_is_rejected() {
        let result = StreamComposer::new(seeded(), Duration::ZERO);
        assert!(matches!(result, Err(TickGateError::ZeroPeriod)));
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_event_per_tick() {
        let composer = composer_with(seeded());
        let start = Instant::now();
        let seeded = composer.store().find_by_id(&MovieId::from("m1")).await;
        assert_eq!(seeded, Ok(Some(Movie::new("m1", "Don 2"))));

        let mut stream = open(&composer, "m1").await;

        let mut previous = None;
        for n in 1..=3_u32 {
            let event = stream.next_event().await;
            let Some(event) = event else {
                panic!("stream ended early");
            };
            assert_eq!(event.movie, Movie::new("m1", "Don 2"));
            assert_eq!(start.elapsed(), PERIOD * n);
            if let Some(prev) = previous {
                assert_eq!(event.when - prev, TimeDelta::seconds(1));
            }
            previous = Some(event.when);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_before_the_first_period() {
        let composer = composer_with(seeded());
        let mut stream = open(&composer, "m1").await;

        let early = tokio::time::timeout(Duration::from_millis(999), stream.next_event()).await;
        assert!(early.is_err());
        let on_time = tokio::time::timeout(Duration::from_millis(2), stream.next_event()).await;
        assert!(matches!(on_time, Ok(Some(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_movie_never_starts_a_producer() {
        let composer = composer_with(seeded());
        let result = composer.open_stream(&MovieId::from("missing")).await;
        assert_eq!(
            result.err(),
            Some(StreamError::NotFound(MovieId::from("missing")))
        );
        assert_eq!(composer.active_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn store_failure_is_upstream_unavailable() {
        let composer = composer_with(Arc::new(BrokenStore));
        let result = composer.open_stream(&MovieId::from("m1")).await;
        assert!(matches!(result, Err(StreamError::UpstreamUnavailable(_))));
        assert_eq!(composer.active_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_does_not_drift_when_the_record_changes() {
        let store = seeded();
        let composer = composer_with(Arc::clone(&store) as Arc<dyn MovieStore>);
        let mut stream = open(&composer, "m1").await;

        let first = stream.next_event().await.map(|e| e.movie);
        assert!(store.save(&Movie::new("m1", "Don 3")).await.is_ok());
        let second = stream.next_event().await.map(|e| e.movie);

        assert_eq!(first, Some(Movie::new("m1", "Don 2")));
        assert_eq!(second, Some(Movie::new("m1", "Don 2")));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_stream_releases_the_producer() {
        let composer = composer_with(seeded());
        let mut stream = open(&composer, "m1").await;
        assert_eq!(composer.active_streams(), 1);
        let _ = stream.next_event().await;

        drop(stream);
        tokio::time::sleep(PERIOD).await;
        assert_eq!(composer.active_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_does_not_queue_missed_ticks() {
        let composer = composer_with(seeded());
        let mut stream = open(&composer, "m1").await;

        // Ten periods pass without reading. The first event sits in the
        // slot; the producer waits on it instead of queueing more.
        tokio::time::sleep(PERIOD * 10).await;

        let mut drained = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(1), stream.next_event()).await
        {
            drained.push(event.when);
        }

        // The buffered event and the one stamped when the slot freed.
        // Nothing else was queued.
        assert_eq!(drained.len(), 2);

        // The period restarts from the stall.
        let early = tokio::time::timeout(Duration::from_millis(900), stream.next_event()).await;
        assert!(early.is_err());
        let on_time = tokio::time::timeout(Duration::from_millis(200), stream.next_event()).await;
        let Ok(Some(event)) = on_time else {
            panic!("no event one period after the stall");
        };
        drained.push(event.when);
        for _ in 0..2 {
            let Some(event) = stream.next_event().await else {
                panic!("stream ended early");
            };
            drained.push(event.when);
        }

        let gaps: Vec<_> = drained.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps.first(), Some(&TimeDelta::seconds(9)));
        assert!(
            gaps.iter().skip(1).all(|gap| *gap >= TimeDelta::seconds(1)),
            "{gaps:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_consumer_never_sees_duplicate_timestamps() {
        let composer = composer_with(seeded());
        let mut stream = open(&composer, "m1").await;
        tokio::time::sleep(PERIOD * 10).await;

        let mut stamps = Vec::new();
        for _ in 0..5 {
            let Some(event) = stream.next_event().await else {
                panic!("stream ended early");
            };
            stamps.push(event.when);
        }
        assert!(stamps.windows(2).all(|w| w[0] < w[1]), "{stamps:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_open_streams() {
        let composer = composer_with(seeded());
        let mut stream = open(&composer, "m1").await;
        let _ = stream.next_event().await;

        composer.shutdown();
        assert!(composer.is_shut_down());
        let rest: Vec<_> = stream.by_ref().collect().await;
        assert!(rest.len() <= 1);
        assert_eq!(composer.active_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn streams_opened_after_shutdown_end_immediately() {
        let composer = composer_with(seeded());
        composer.shutdown();
        let stream = open(&composer, "m1").await;
        let events: Vec<_> = stream.collect().await;
        assert!(events.is_empty());
    }
}

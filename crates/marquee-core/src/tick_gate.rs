//! Periodic pacing clock for event streams.
//!
//! A [`TickGate`] fires once per period, starting one full period after it
//! is created. Ticks carry an increasing ordinal but no payload; the stream
//! composer only uses them to decide *when* to emit.
//!
//! # Design Principles
//!
//! - No tick at time zero. The first emission of a stream happens one
//!   period after it opens.
//! - A slow consumer delays ticks rather than letting them pile up. When a
//!   tick is missed, the next one fires as soon as possible and the period
//!   restarts from there, so ticks are never delivered in a burst.
//! - The owner can restart the period with [`TickGate::reset`] when it was
//!   itself held up after a tick fired.
//! - The gate owns its timer. Dropping the gate releases it.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Errors that can occur when building a tick gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickGateError {
    /// The period was zero.
    #[error("tick period must be greater than zero")]
    ZeroPeriod,

    /// The first tick deadline is not representable.
    #[error("tick period {period:?} overflows the clock")]
    Overflow {
        /// The requested period.
        period: Duration,
    },
}

/// A single pacing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    ordinal: u64,
    fired_at: Instant,
}

impl Tick {
    /// Zero-based position of this tick since the gate was created.
    pub const fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Monotonic instant the tick was scheduled for.
    pub const fn fired_at(&self) -> Instant {
        self.fired_at
    }
}

/// Emits a [`Tick`] every `period`, forever.
#[derive(Debug)]
pub struct TickGate {
    interval: Interval,
    next_ordinal: u64,
}

impl TickGate {
    /// Create a gate whose first tick fires one `period` from now.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TickGateError::ZeroPeriod`] for a zero period and
    /// [`TickGateError::Overflow`] if the first deadline cannot be computed.
    pub fn new(period: Duration) -> Result<Self, TickGateError> {
        validate_period(period)?;
        let start = Instant::now()
            .checked_add(period)
            .ok_or(TickGateError::Overflow { period })?;

        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            interval,
            next_ordinal: 0,
        })
    }

    /// Wait for the next tick.
    ///
    /// Cancel-safe: dropping the returned future before it completes does
    /// not consume a tick.
    pub async fn tick(&mut self) -> Tick {
        let fired_at = self.interval.tick().await;
        let ordinal = self.next_ordinal;
        self.next_ordinal = self.next_ordinal.saturating_add(1);
        Tick { ordinal, fired_at }
    }

    /// Schedule the next tick one full period from now.
    pub fn reset(&mut self) {
        self.interval.reset();
    }

    /// Number of ticks delivered so far.
    pub const fn ticks_delivered(&self) -> u64 {
        self.next_ordinal
    }
}

/// Reject periods a gate cannot run with.
///
/// # Errors
///
/// Returns [`TickGateError::ZeroPeriod`] if `period` is zero.
pub const fn validate_period(period: Duration) -> Result<(), TickGateError> {
    if period.is_zero() {
        return Err(TickGateError::ZeroPeriod);
    }
    Ok(())
}

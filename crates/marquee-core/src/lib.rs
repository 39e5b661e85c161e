//! Movie store contract and paced event streaming for Marquee.
//!
//! This crate owns the one piece of real machinery in the service: turning
//! a single movie lookup into an unbounded, one-event-per-tick stream that
//! stops as soon as its consumer goes away.
//!
//! # Modules
//!
//! - [`store`] -- [`MovieStore`] trait and the in-memory [`MemoryStore`].
//! - [`tick_gate`] -- [`TickGate`], the periodic pacing clock.
//! - [`sequence`] -- [`EventSequence`], the infinite event generator.
//! - [`composer`] -- [`StreamComposer`], which pairs ticks with generated
//!   events and hands them off through a single-slot channel.
//! - [`config`] -- Configuration loading from `marquee-config.yaml` into
//!   strongly-typed structs.
//!
//! [`MovieStore`]: store::MovieStore
//! [`MemoryStore`]: store::MemoryStore
//! [`TickGate`]: tick_gate::TickGate
//! [`EventSequence`]: sequence::EventSequence
//! [`StreamComposer`]: composer::StreamComposer

pub mod composer;
pub mod config;
pub mod sequence;
pub mod store;
pub mod tick_gate;

pub use composer::{EventStream, StreamComposer, StreamError};
pub use sequence::EventSequence;
pub use store::{MemoryStore, MovieStore, StoreError};
pub use tick_gate::{Tick, TickGate, TickGateError};

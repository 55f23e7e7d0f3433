//! telemetry/mod.rs
//! Counters, stage timers, and immutable snapshots for the record pipeline.
//!
//! Notes:
//! - Counters are plain values owned by one stage; stages merge them at the end instead of sharing atomics.
//! - Snapshots are immutable and serializable so callers can log or export them.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;

//! Clocks and loop telemetry.
//!
//! The engine owns no timer. Hosts fire [`crate::engine::Engine::tick`]
//! on whatever cadence suits them and pass the current time in; the clock
//! is injectable so tests and headless harnesses can simulate arbitrary
//! gaps without waiting on real timers.

use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Source of wall-clock time in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Real wall clock, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64() * 1_000.0)
            .unwrap_or(0.0)
    }
}

/// Deterministic clock for tests and headless harnesses.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Loop health counters surfaced in snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopTelemetry {
    /// When the last tick fired.
    pub last_tick_ms: f64,
    /// How long the last tick took to process.
    pub last_tick_duration_ms: f64,
    /// Wall-clock distance between the last two ticks.
    pub last_delta_ms: f64,
    /// How far the last delta ran past the configured loop interval.
    pub drift_ms: f64,
}

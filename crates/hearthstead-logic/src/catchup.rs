//! Offline catch-up accounting.
//!
//! Replaying a multi-hour absence millisecond by millisecond is unbounded
//! work, so elapsed time is replayed in coarse steps instead. Each executed
//! step drives one action completion even when the action needed more time
//! than one step covers; the unmet remainder is charged to a per-character
//! slack bucket, and every full step's worth of slack converts into one
//! skipped future iteration. Total simulated action-time then converges on
//! the real gap without fine-grained replay.
//!
//! The structures here are pure bookkeeping. The engine owns the loop that
//! walks characters and applies completions.

use serde::{Deserialize, Serialize};

/// Shape of one offline replay: how long was missed and how it is stepped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatchupPlan {
    pub elapsed_ms: f64,
    pub step_ms: f64,
    /// Number of coarse slices the gap divides into.
    pub loop_count: u64,
}

impl CatchupPlan {
    pub fn new(elapsed_ms: f64, step_ms: f64) -> Self {
        let elapsed_ms = elapsed_ms.max(0.0);
        let loop_count = if step_ms > 0.0 {
            (elapsed_ms / step_ms).floor() as u64
        } else {
            0
        };
        Self {
            elapsed_ms,
            step_ms,
            loop_count,
        }
    }
}

/// Per-character slack ("garbage time") accumulator for one replay.
///
/// Charged with the remainder an action still needed when its completion
/// was forced by a coarse step. Consumed one step at a time at the top of
/// later iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackBucket {
    accrued_ms: f64,
}

impl SlackBucket {
    pub fn charge(&mut self, remainder_ms: f64) {
        self.accrued_ms += remainder_ms.max(0.0);
    }

    /// Consume one step's worth of slack if enough is owed. Returns true
    /// when the caller should skip this iteration for the character.
    pub fn consume_skip(&mut self, step_ms: f64) -> bool {
        if step_ms > 0.0 && self.accrued_ms >= step_ms {
            self.accrued_ms -= step_ms;
            true
        } else {
            false
        }
    }

    pub fn accrued_ms(&self) -> f64 {
        self.accrued_ms
    }

    pub fn reset(&mut self) {
        self.accrued_ms = 0.0;
    }
}

/// What one offline replay did, for the catch-up dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CatchupSummary {
    pub elapsed_ms: f64,
    /// Coarse slices the gap divided into.
    pub loop_count: u64,
    pub loops_skipped: u64,
    /// `loop_count - loops_skipped`.
    pub loops_executed: u64,
    /// Action completions applied across all characters.
    pub completions: u64,
}

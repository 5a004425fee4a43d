//! Pure progression logic for Hearthstead.
//!
//! This crate contains all idle-game math that is independent of any ECS,
//! clock, or runtime. Functions take plain data and return results, making
//! them unit-testable and portable between the native engine and any future
//! host (browser runtime, headless balance tools).
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catchup`] | Offline catch-up plans and slack-time skip accounting |
//! | [`constants`] | Tuning constants (tick rates, stat scaling, pricing) |
//! | [`economy`] | Sell pricing and roster slot pricing |
//! | [`leveling`] | Shared skill/recipe experience curve |
//! | [`stats`] | Stat resolution, modifier auditing, derived multipliers |

pub mod catchup;
pub mod constants;
pub mod economy;
pub mod leveling;
pub mod stats;

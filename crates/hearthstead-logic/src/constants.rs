//! Tuning constants shared by the engine and the headless harness.
//!
//! These are plain numbers with no runtime dependency. The engine copies
//! them into its config struct so individual deployments can override them
//! without touching this crate.

/// Fraction of a derived multiplier contributed by one effective stat point.
/// One point of agility shaves 1% off an action interval, one point of
/// intellect adds 1% experience on eligible actions.
pub const STAT_PERCENT_PER_POINT: f64 = 0.01;

/// Hard floor for a resolved action interval, before stun time is added.
/// No amount of agility pushes an action below this.
pub const MIN_ACTION_INTERVAL_MS: f64 = 500.0;

/// Period of the live scheduler loop.
pub const LOOP_INTERVAL_MS: f64 = 250.0;

/// A delta longer than `LOOP_INTERVAL_MS * OFFLINE_THRESHOLD` is treated as
/// an offline gap and replayed instead of ticked.
pub const OFFLINE_THRESHOLD: f64 = 1.5;

/// Coarse step used when replaying an offline gap. Larger than the live
/// tick so multi-hour gaps stay bounded in work.
pub const OFFLINE_INTERVAL_MS: f64 = 500.0;

/// Item id of the currency. Lives in the shared inventory like any other
/// item but is never sellable.
pub const GOLD_ITEM_ID: &str = "gold";

/// Default stamina pool for freshly recruited characters.
pub const DEFAULT_STAMINA_MAX: f64 = 100.0;

/// Experience threshold growth applied on every level-up.
pub const XP_NEXT_MULTIPLIER: f64 = 1.5;

/// Roster slot pricing: `cost(limit) = base * growth^(limit - 1)`.
pub const ROSTER_BASE_COST: f64 = 100.0;
pub const ROSTER_COST_GROWTH: f64 = 1.5;

/// Hard cap on roster size regardless of gold.
pub const ROSTER_MAX_SIZE: u32 = 10;

//! Shared experience curve for skills and recipes.
//!
//! Both skill levels and recipe levels advance through the same algorithm:
//! experience accumulates toward a threshold, and crossing the threshold
//! consumes it, bumps the level, and grows the next threshold by a
//! multiplicative factor.
//!
//! The level-up check fires once per grant, never in a loop. A grant large
//! enough to cross two thresholds still advances a single level; the
//! surplus stays banked toward the next one. At the level cap experience
//! accrual is clamped so counters stay bounded.

use serde::{Deserialize, Serialize};

/// One independent leveling track. Skills own one, and every recipe under
/// a skill owns its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressTrack {
    pub level: u32,
    pub xp: f64,
    pub xp_next: f64,
    pub max_level: u32,
}

impl ProgressTrack {
    /// Fresh track at level 1 with the given first threshold.
    pub fn new(xp_next: f64, max_level: u32) -> Self {
        Self {
            level: 1,
            xp: 0.0,
            xp_next: xp_next.max(1.0),
            max_level: max_level.max(1),
        }
    }

    pub fn is_capped(&self) -> bool {
        self.level >= self.max_level
    }

    /// Fill fraction of the current level, for progress bars.
    pub fn fraction(&self) -> f64 {
        if self.xp_next <= 0.0 {
            0.0
        } else {
            (self.xp / self.xp_next).clamp(0.0, 1.0)
        }
    }
}

/// Curve shape shared by every track in a game instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelCurveConfig {
    /// Threshold growth per level-up. Must be >= 1.0 for a sane curve.
    pub xp_next_multiplier: f64,
}

impl Default for LevelCurveConfig {
    fn default() -> Self {
        Self {
            xp_next_multiplier: crate::constants::XP_NEXT_MULTIPLIER,
        }
    }
}

/// What a single experience grant did to a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrantOutcome {
    pub leveled_up: bool,
    /// Level after the grant.
    pub level: u32,
}

/// Grant experience to a track and run the level-up check once.
///
/// Negative amounts are ignored. At the cap, experience is clamped to the
/// final threshold and the level no longer moves.
pub fn grant_xp(track: &mut ProgressTrack, amount: f64, curve: &LevelCurveConfig) -> GrantOutcome {
    track.xp += amount.max(0.0);

    if track.is_capped() {
        track.xp = track.xp.min(track.xp_next);
        return GrantOutcome {
            leveled_up: false,
            level: track.level,
        };
    }

    if track.xp >= track.xp_next {
        track.xp -= track.xp_next;
        track.level += 1;
        track.xp_next = (track.xp_next * curve.xp_next_multiplier.max(1.0)).floor();
        if track.is_capped() {
            track.xp = track.xp.min(track.xp_next);
        }
        return GrantOutcome {
            leveled_up: true,
            level: track.level,
        };
    }

    GrantOutcome {
        leveled_up: false,
        level: track.level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> LevelCurveConfig {
        LevelCurveConfig {
            xp_next_multiplier: 1.5,
        }
    }

    #[test]
    fn grant_below_threshold_accumulates() {
        let mut t = ProgressTrack::new(10.0, 99);
        let out = grant_xp(&mut t, 4.0, &curve());
        assert!(!out.leveled_up);
        assert_eq!(t.level, 1);
        assert!((t.xp - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grant_crossing_threshold_levels_once() {
        let mut t = ProgressTrack::new(10.0, 99);
        let out = grant_xp(&mut t, 12.0, &curve());
        assert!(out.leveled_up);
        assert_eq!(t.level, 2);
        assert!((t.xp - 2.0).abs() < f64::EPSILON);
        assert!((t.xp_next - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_growth_is_floored() {
        let mut t = ProgressTrack::new(11.0, 99);
        grant_xp(&mut t, 11.0, &curve());
        // 11 * 1.5 = 16.5 floors to 16
        assert!((t.xp_next - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_never_shrinks_for_growth_above_one() {
        let mut t = ProgressTrack::new(10.0, 99);
        let mut previous = t.xp_next;
        for _ in 0..20 {
            let needed = t.xp_next;
            grant_xp(&mut t, needed, &curve());
            assert!(t.xp_next >= previous);
            previous = t.xp_next;
        }
    }

    #[test]
    fn single_check_per_grant_suppresses_multi_level_jump() {
        let mut t = ProgressTrack::new(10.0, 99);
        // Enough for three levels, but only one fires.
        let out = grant_xp(&mut t, 100.0, &curve());
        assert!(out.leveled_up);
        assert_eq!(t.level, 2);
        // The surplus stays banked and the next grant levels again.
        let out = grant_xp(&mut t, 0.0, &curve());
        assert!(out.leveled_up);
        assert_eq!(t.level, 3);
    }

    #[test]
    fn xp_invariant_holds_for_ordinary_grants() {
        let mut t = ProgressTrack::new(10.0, 99);
        for _ in 0..200 {
            grant_xp(&mut t, 3.0, &curve());
            if !t.is_capped() {
                assert!(t.xp >= 0.0);
                assert!(t.xp < t.xp_next, "xp {} >= xp_next {}", t.xp, t.xp_next);
            }
        }
    }

    #[test]
    fn cap_stops_leveling_and_clamps_xp() {
        let mut t = ProgressTrack::new(10.0, 2);
        grant_xp(&mut t, 10.0, &curve());
        assert_eq!(t.level, 2);
        assert!(t.is_capped());
        let before_next = t.xp_next;
        for _ in 0..50 {
            let out = grant_xp(&mut t, 1000.0, &curve());
            assert!(!out.leveled_up);
        }
        assert_eq!(t.level, 2);
        assert!((t.xp_next - before_next).abs() < f64::EPSILON);
        assert!(t.xp <= t.xp_next);
    }

    #[test]
    fn negative_grant_is_ignored() {
        let mut t = ProgressTrack::new(10.0, 99);
        grant_xp(&mut t, 5.0, &curve());
        grant_xp(&mut t, -3.0, &curve());
        assert!((t.xp - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fraction_tracks_fill() {
        let mut t = ProgressTrack::new(10.0, 99);
        assert!((t.fraction() - 0.0).abs() < f64::EPSILON);
        grant_xp(&mut t, 5.0, &curve());
        assert!((t.fraction() - 0.5).abs() < f64::EPSILON);
    }
}

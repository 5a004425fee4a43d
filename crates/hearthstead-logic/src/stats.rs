//! Stat resolution and derived multipliers.
//!
//! A character's effective stats combine raw allocated points with every
//! equipped item's modifiers: flat modifiers sum onto the base, then
//! multiplicative modifiers scale the result. Each applied modifier is
//! recorded with a stable identity and a source label so the interface can
//! answer "why is my agility +12" without re-deriving anything.
//!
//! Two scalars feed the simulation: agility shortens action intervals and
//! intellect boosts experience on eligible actions. Resolution takes the
//! current timestamp because modifiers may carry an expiry (timed buffs);
//! the standard equipment tables ship none.

use crate::constants::STAT_PERCENT_PER_POINT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named character stats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Stat {
    Strength,
    Agility,
    Intellect,
    Endurance,
    Luck,
}

impl Stat {
    /// All stats in display order.
    pub const ALL: [Stat; 5] = [
        Stat::Strength,
        Stat::Agility,
        Stat::Intellect,
        Stat::Endurance,
        Stat::Luck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Strength => "strength",
            Stat::Agility => "agility",
            Stat::Intellect => "intellect",
            Stat::Endurance => "endurance",
            Stat::Luck => "luck",
        }
    }
}

/// How a modifier combines with the base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Added to the base before multiplication.
    Flat,
    /// `value` is a fraction, e.g. 0.10 for +10%.
    Percent,
}

/// One stat modifier as defined on an equipment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: Stat,
    pub kind: ModifierKind,
    pub value: f64,
    /// Absolute expiry timestamp for timed buffs. `None` means permanent.
    #[serde(default)]
    pub expires_at_ms: Option<f64>,
}

impl StatModifier {
    pub fn flat(stat: Stat, value: f64) -> Self {
        Self {
            stat,
            kind: ModifierKind::Flat,
            value,
            expires_at_ms: None,
        }
    }

    pub fn percent(stat: Stat, value: f64) -> Self {
        Self {
            stat,
            kind: ModifierKind::Percent,
            value,
            expires_at_ms: None,
        }
    }

    pub fn is_active(&self, now_ms: f64) -> bool {
        self.expires_at_ms.map_or(true, |t| now_ms < t)
    }
}

/// One equipped item as the resolver sees it.
pub struct ModifierSource<'a> {
    pub item_id: &'a str,
    /// Human-readable label, usually the item name.
    pub label: &'a str,
    pub modifiers: &'a [StatModifier],
}

/// A modifier that actually applied, with its audit identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModifier {
    /// Stable identity: `itemId:stat:index`, where index is the modifier's
    /// position in the item's definition.
    pub id: String,
    pub source: String,
    pub stat: Stat,
    pub kind: ModifierKind,
    pub value: f64,
}

/// Raw allocated stat points, keyed by stat.
pub type RawStats = BTreeMap<Stat, i32>;

/// Fully resolved stats plus the audit trail that produced them.
#[derive(Debug, Clone, Default)]
pub struct EffectiveStats {
    values: BTreeMap<Stat, f64>,
    pub audit: Vec<ResolvedModifier>,
}

impl EffectiveStats {
    pub fn get(&self, stat: Stat) -> f64 {
        self.values.get(&stat).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::ALL.iter().map(|s| (*s, self.get(*s)))
    }
}

/// Resolve raw stats against a set of equipped modifier sources.
///
/// Per stat: `effective = (raw + sum of flats) * product of (1 + percent)`.
/// Expired modifiers neither apply nor appear in the audit, but indices in
/// modifier identities always refer to the item's full definition so they
/// stay stable as buffs lapse.
pub fn resolve(raw: &RawStats, sources: &[ModifierSource<'_>], now_ms: f64) -> EffectiveStats {
    let mut flats: BTreeMap<Stat, f64> = BTreeMap::new();
    let mut scales: BTreeMap<Stat, f64> = BTreeMap::new();
    let mut audit = Vec::new();

    for source in sources {
        for (index, modifier) in source.modifiers.iter().enumerate() {
            if !modifier.is_active(now_ms) {
                continue;
            }
            match modifier.kind {
                ModifierKind::Flat => {
                    *flats.entry(modifier.stat).or_insert(0.0) += modifier.value;
                }
                ModifierKind::Percent => {
                    *scales.entry(modifier.stat).or_insert(1.0) *= 1.0 + modifier.value;
                }
            }
            audit.push(ResolvedModifier {
                id: format!("{}:{}:{}", source.item_id, modifier.stat.name(), index),
                source: source.label.to_string(),
                stat: modifier.stat,
                kind: modifier.kind,
                value: modifier.value,
            });
        }
    }

    let mut values = BTreeMap::new();
    for stat in Stat::ALL {
        let base = raw.get(&stat).copied().unwrap_or(0) as f64;
        let flat = flats.get(&stat).copied().unwrap_or(0.0);
        let scale = scales.get(&stat).copied().unwrap_or(1.0);
        values.insert(stat, (base + flat) * scale);
    }

    EffectiveStats { values, audit }
}

/// Interval scale from agility. Can go to zero or below for extreme
/// values; the interval floor catches that.
pub fn speed_multiplier(agility: f64) -> f64 {
    1.0 - agility * STAT_PERCENT_PER_POINT
}

/// Experience scale from intellect, for eligible actions only.
pub fn xp_multiplier(intellect: f64) -> f64 {
    1.0 + intellect * STAT_PERCENT_PER_POINT
}

/// Resolved duration of one action cycle, before any stun extension.
pub fn action_interval_ms(base_interval_ms: f64, agility: f64, min_interval_ms: f64) -> f64 {
    (base_interval_ms * speed_multiplier(agility))
        .ceil()
        .max(min_interval_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(points: &[(Stat, i32)]) -> RawStats {
        points.iter().copied().collect()
    }

    #[test]
    fn resolve_without_equipment_is_raw() {
        let stats = resolve(&raw(&[(Stat::Agility, 7)]), &[], 0.0);
        assert!((stats.get(Stat::Agility) - 7.0).abs() < f64::EPSILON);
        assert!((stats.get(Stat::Strength) - 0.0).abs() < f64::EPSILON);
        assert!(stats.audit.is_empty());
    }

    #[test]
    fn flat_then_percent_ordering() {
        let modifiers = [
            StatModifier::flat(Stat::Strength, 5.0),
            StatModifier::percent(Stat::Strength, 0.10),
        ];
        let sources = [ModifierSource {
            item_id: "iron_blade",
            label: "Iron Blade",
            modifiers: &modifiers,
        }];
        let stats = resolve(&raw(&[(Stat::Strength, 10)]), &sources, 0.0);
        // (10 + 5) * 1.10
        assert!((stats.get(Stat::Strength) - 16.5).abs() < 1e-9);
    }

    #[test]
    fn percent_modifiers_stack_multiplicatively() {
        let a = [StatModifier::percent(Stat::Agility, 0.10)];
        let b = [StatModifier::percent(Stat::Agility, 0.20)];
        let sources = [
            ModifierSource {
                item_id: "a",
                label: "A",
                modifiers: &a,
            },
            ModifierSource {
                item_id: "b",
                label: "B",
                modifiers: &b,
            },
        ];
        let stats = resolve(&raw(&[(Stat::Agility, 10)]), &sources, 0.0);
        assert!((stats.get(Stat::Agility) - 10.0 * 1.1 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn audit_identity_is_item_stat_index() {
        let modifiers = [
            StatModifier::flat(Stat::Agility, 4.0),
            StatModifier::flat(Stat::Luck, 1.0),
        ];
        let sources = [ModifierSource {
            item_id: "swift_boots",
            label: "Swift Boots",
            modifiers: &modifiers,
        }];
        let stats = resolve(&RawStats::new(), &sources, 0.0);
        assert_eq!(stats.audit.len(), 2);
        assert_eq!(stats.audit[0].id, "swift_boots:agility:0");
        assert_eq!(stats.audit[1].id, "swift_boots:luck:1");
        assert_eq!(stats.audit[0].source, "Swift Boots");
    }

    #[test]
    fn expired_modifier_is_skipped_but_indices_stay_stable() {
        let modifiers = [
            StatModifier {
                stat: Stat::Agility,
                kind: ModifierKind::Flat,
                value: 4.0,
                expires_at_ms: Some(1_000.0),
            },
            StatModifier::flat(Stat::Luck, 1.0),
        ];
        let sources = [ModifierSource {
            item_id: "charm",
            label: "Charm",
            modifiers: &modifiers,
        }];

        let before = resolve(&RawStats::new(), &sources, 500.0);
        assert!((before.get(Stat::Agility) - 4.0).abs() < f64::EPSILON);

        let after = resolve(&RawStats::new(), &sources, 2_000.0);
        assert!((after.get(Stat::Agility) - 0.0).abs() < f64::EPSILON);
        assert_eq!(after.audit.len(), 1);
        // The surviving modifier keeps its original index.
        assert_eq!(after.audit[0].id, "charm:luck:1");
    }

    #[test]
    fn speed_multiplier_scales_per_point() {
        assert!((speed_multiplier(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((speed_multiplier(10.0) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn xp_multiplier_scales_per_point() {
        assert!((xp_multiplier(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((xp_multiplier(10.0) - 1.1).abs() < 1e-9);
    }

    #[test]
    fn interval_floor_holds_for_any_agility() {
        for agility in [0.0, 50.0, 100.0, 500.0, 10_000.0] {
            let interval = action_interval_ms(2_000.0, agility, 500.0);
            assert!(interval >= 500.0, "agility {} broke the floor", agility);
        }
    }

    #[test]
    fn interval_is_ceiled() {
        // 2000 * 0.99 = 1980, 1001 * 0.99 = 990.99 ceils to 991
        assert!((action_interval_ms(2_000.0, 1.0, 500.0) - 1_980.0).abs() < f64::EPSILON);
        assert!((action_interval_ms(1_001.0, 1.0, 500.0) - 991.0).abs() < f64::EPSILON);
    }
}

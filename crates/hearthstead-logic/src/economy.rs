//! Sell pricing and roster slot pricing.
//!
//! Pure formulas only. Which table a given item id falls under (currency,
//! equipment, plain resource) is the definition set's concern; this module
//! prices whatever it is handed.

use crate::stats::StatModifier;

/// Sell value of an equipment item, derived from its modifier weight.
/// Weapons carry a small premium. Never below 1 gold.
pub fn equipment_sell_value(is_weapon: bool, modifiers: &[StatModifier]) -> u64 {
    let weight: f64 = modifiers.iter().map(|m| m.value.abs()).sum();
    let premium = if is_weapon { 5.0 } else { 0.0 };
    (10.0 + premium + 5.0 * weight).max(1.0).round() as u64
}

/// Gold gained from selling `count` units at `unit_value` each.
/// Fractional counts floor, negative counts sell nothing.
pub fn sell_gold_gain(unit_value: u64, count: f64) -> u64 {
    unit_value * count.floor().max(0.0) as u64
}

/// Price of expanding the roster from `current_limit` slots to one more.
/// Monotonically increasing for growth > 1. Never below 1 gold.
pub fn roster_slot_cost(current_limit: u32, base: f64, growth: f64) -> u64 {
    (base * growth.powi(current_limit.max(1) as i32 - 1))
        .max(1.0)
        .round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Stat;

    #[test]
    fn equipment_value_from_modifier_weight() {
        let modifiers = [
            StatModifier::flat(Stat::Strength, 3.0),
            StatModifier::flat(Stat::Agility, -1.0),
        ];
        // 10 + 5 * (3 + 1) = 30, negative values count by magnitude
        assert_eq!(equipment_sell_value(false, &modifiers), 30);
        // weapons add 5
        assert_eq!(equipment_sell_value(true, &modifiers), 35);
    }

    #[test]
    fn bare_equipment_still_worth_base() {
        assert_eq!(equipment_sell_value(false, &[]), 10);
        assert_eq!(equipment_sell_value(true, &[]), 15);
    }

    #[test]
    fn sell_gain_is_linear_in_count() {
        for n in 0..20u64 {
            assert_eq!(sell_gold_gain(7, n as f64), 7 * n);
        }
    }

    #[test]
    fn sell_gain_floors_and_clamps() {
        assert_eq!(sell_gold_gain(7, 2.9), 14);
        assert_eq!(sell_gold_gain(7, -3.0), 0);
    }

    #[test]
    fn roster_cost_matches_reference_curve() {
        assert_eq!(roster_slot_cost(1, 100.0, 1.5), 100);
        assert_eq!(roster_slot_cost(2, 100.0, 1.5), 150);
        assert_eq!(roster_slot_cost(3, 100.0, 1.5), 225);
    }

    #[test]
    fn roster_cost_is_strictly_monotonic() {
        let mut previous = 0;
        for limit in 1..12 {
            let cost = roster_slot_cost(limit, 100.0, 1.5);
            assert!(cost > previous, "cost({}) = {} not above {}", limit, cost, previous);
            previous = cost;
        }
    }

    #[test]
    fn roster_cost_never_below_one() {
        assert_eq!(roster_slot_cost(1, 0.0, 1.5), 1);
    }
}

//! Component definitions for the character ECS.
//!
//! Components are pure data structs attached to character entities.
//! They have no behavior beyond small invariant-keeping helpers; the
//! simulation lives in systems.

use crate::definitions::{DefinitionSet, EquipSlot};
use hearthstead_logic::catchup::SlackBucket;
use hearthstead_logic::leveling::ProgressTrack;
use hearthstead_logic::stats::{RawStats, Stat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable roster-wide character id, independent of ECS entity ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CharacterId(pub u32);

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who a character is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: CharacterId,
    pub name: String,
}

/// Depletable action fuel. At zero the next action cycle pays a stun
/// extension, then the pool refills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stamina {
    pub current: f64,
    pub max: f64,
}

impl Stamina {
    pub fn full(max: f64) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    /// Drain clamps at zero, never negative.
    pub fn drain(&mut self, amount: f64) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    pub fn refill(&mut self) {
        self.current = self.max;
    }

    /// Restore the `0 <= current <= max` invariant after loading
    /// untrusted state.
    pub fn clamp(&mut self) {
        self.max = self.max.max(0.0);
        self.current = self.current.clamp(0.0, self.max);
    }
}

/// Raw allocated stat points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub allocated: RawStats,
}

impl Attributes {
    pub fn allocate(&mut self, stat: Stat, points: u32) {
        *self.allocated.entry(stat).or_insert(0) += points as i32;
    }
}

/// Equipped items by slot. Equipment is referenced, not consumed: the
/// inventory count is untouched by equipping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub slots: BTreeMap<EquipSlot, String>,
}

impl Loadout {
    pub fn equip(&mut self, slot: EquipSlot, item_id: impl Into<String>) -> Option<String> {
        self.slots.insert(slot, item_id.into())
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Option<String> {
        self.slots.remove(&slot)
    }

    pub fn equipped(&self, slot: EquipSlot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.values().map(String::as_str)
    }

    /// Drop every slot referencing `item_id`. Used when the last copy of
    /// an item leaves the inventory.
    pub fn clear_item(&mut self, item_id: &str) {
        self.slots.retain(|_, equipped| equipped != item_id);
    }
}

/// Mutable per-skill progression state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    pub progress: ProgressTrack,
    pub base_interval_ms: f64,
    pub selected_recipe: Option<String>,
    /// Recipe id to its independent leveling track.
    pub recipes: BTreeMap<String, ProgressTrack>,
}

impl SkillState {
    /// Default state for a skill, as seeded at roster-add time.
    pub fn seeded(defs: &DefinitionSet, skill_id: &str) -> Option<Self> {
        let action = defs.action(skill_id)?;
        let recipes = defs
            .recipes_for(skill_id)
            .map(|table| {
                table
                    .iter()
                    .map(|(recipe_id, recipe)| {
                        (
                            recipe_id.clone(),
                            ProgressTrack::new(recipe.xp_next_base, recipe.max_level),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            progress: ProgressTrack::new(action.xp_next_base, action.max_level),
            base_interval_ms: action.base_interval_ms,
            selected_recipe: None,
            recipes,
        })
    }
}

/// Every skill a character has, keyed by skill id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillBook {
    pub skills: BTreeMap<String, SkillState>,
}

impl SkillBook {
    /// One entry per action definition, all at their starting levels.
    pub fn seeded(defs: &DefinitionSet) -> Self {
        let skills = defs
            .actions
            .keys()
            .filter_map(|skill_id| {
                SkillState::seeded(defs, skill_id).map(|state| (skill_id.clone(), state))
            })
            .collect();
        Self { skills }
    }

    pub fn get(&self, skill_id: &str) -> Option<&SkillState> {
        self.skills.get(skill_id)
    }

    pub fn get_mut(&mut self, skill_id: &str) -> Option<&mut SkillState> {
        self.skills.get_mut(skill_id)
    }
}

/// Where the character is inside its current action cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionState {
    /// Skill id of the armed action, if any.
    pub selected: Option<String>,
    /// Time accumulated toward the next completion.
    pub current_interval_ms: f64,
    /// Fill fraction of the current cycle, for progress bars.
    pub progress: f64,
    /// Catch-up slack owed from the last offline replay.
    #[serde(default)]
    pub slack: SlackBucket,
}

impl ActionState {
    pub fn arm(&mut self, skill_id: Option<String>) {
        self.selected = skill_id;
        self.current_interval_ms = 0.0;
        self.progress = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamina_drain_clamps_at_zero() {
        let mut stamina = Stamina::full(100.0);
        stamina.drain(250.0);
        assert!((stamina.current - 0.0).abs() < f64::EPSILON);
        assert!(stamina.is_empty());
        stamina.refill();
        assert!((stamina.current - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stamina_clamp_restores_invariant() {
        let mut stamina = Stamina {
            current: 500.0,
            max: 100.0,
        };
        stamina.clamp();
        assert!((stamina.current - 100.0).abs() < f64::EPSILON);

        let mut negative = Stamina {
            current: -5.0,
            max: 100.0,
        };
        negative.clamp();
        assert!((negative.current - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn loadout_clear_item_empties_matching_slots() {
        let mut loadout = Loadout::default();
        loadout.equip(EquipSlot::MainHand, "copper_cleaver");
        loadout.equip(EquipSlot::Trinket, "lucky_coin");
        loadout.clear_item("copper_cleaver");
        assert_eq!(loadout.equipped(EquipSlot::MainHand), None);
        assert_eq!(loadout.equipped(EquipSlot::Trinket), Some("lucky_coin"));
    }

    #[test]
    fn arm_resets_cycle_state() {
        let mut action = ActionState {
            selected: Some("cooking".to_string()),
            current_interval_ms: 1_234.0,
            progress: 0.6,
            slack: SlackBucket::default(),
        };
        action.arm(Some("forestry".to_string()));
        assert_eq!(action.selected.as_deref(), Some("forestry"));
        assert!((action.current_interval_ms - 0.0).abs() < f64::EPSILON);
        assert!((action.progress - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn attributes_accumulate_points() {
        let mut attributes = Attributes::default();
        attributes.allocate(Stat::Agility, 3);
        attributes.allocate(Stat::Agility, 2);
        assert_eq!(attributes.allocated.get(&Stat::Agility), Some(&5));
    }
}

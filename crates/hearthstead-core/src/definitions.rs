//! Static definition tables.
//!
//! Everything a character can do is data: one [`ActionDefinition`] per
//! skill, a [`RecipeDefinition`] table per skill, and an
//! [`EquipmentDefinition`] per equippable item. The tables load once at
//! startup (usually from JSON) and are never mutated by the engine. There
//! is no per-skill code anywhere; the progression system is one generic
//! function parameterized by these records.

use hearthstead_logic::constants::GOLD_ITEM_ID;
use hearthstead_logic::economy::equipment_sell_value;
use hearthstead_logic::stats::StatModifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Equipment slots on a character.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EquipSlot {
    Head,
    Chest,
    Legs,
    MainHand,
    OffHand,
    Trinket,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 6] = [
        EquipSlot::Head,
        EquipSlot::Chest,
        EquipSlot::Legs,
        EquipSlot::MainHand,
        EquipSlot::OffHand,
        EquipSlot::Trinket,
    ];
}

fn one() -> f64 {
    1.0
}

fn level_one() -> u32 {
    1
}

fn default_max_level() -> u32 {
    99
}

fn default_xp_next() -> f64 {
    10.0
}

/// The timed activity behind one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub skill_id: String,
    pub name: String,
    /// Unmodified duration of one cycle.
    pub base_interval_ms: f64,
    /// Default costs and rewards; recipes may override them.
    #[serde(default)]
    pub item_costs: BTreeMap<String, u64>,
    #[serde(default)]
    pub item_rewards: BTreeMap<String, u64>,
    #[serde(default)]
    pub gold_reward: u64,
    /// Experience per completion for the skill track and the recipe track.
    pub xp_skill: f64,
    pub xp_recipe: f64,
    /// Stamina drained per completion, before the stamina multiplier.
    #[serde(default)]
    pub stamina_cost: f64,
    /// Interval extension paid once per stamina collapse.
    #[serde(default)]
    pub stun_time_ms: f64,
    /// Per-action reward scaling knobs.
    #[serde(default = "one")]
    pub gold_multiplier: f64,
    #[serde(default = "one")]
    pub xp_multiplier: f64,
    #[serde(default = "one")]
    pub stamina_multiplier: f64,
    /// Whether intellect boosts this action's experience.
    #[serde(default)]
    pub intellect_bonus: bool,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// First experience threshold for the skill track.
    #[serde(default = "default_xp_next")]
    pub xp_next_base: f64,
}

/// One output variant of a skill, independently leveled and gated behind a
/// skill level. Optional fields override the action's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    pub recipe_id: String,
    pub name: String,
    #[serde(default = "level_one")]
    pub unlock_level: u32,
    #[serde(default)]
    pub item_costs: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub item_rewards: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub gold_reward: Option<u64>,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// First experience threshold for this recipe's track.
    #[serde(default = "default_xp_next")]
    pub xp_next_base: f64,
}

/// An equippable item. Equipment is referenced from inventory, never
/// consumed by equipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDefinition {
    pub item_id: String,
    pub name: String,
    pub slot: EquipSlot,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    /// Present on weapons, e.g. "axe". Raises sell value.
    #[serde(default)]
    pub weapon_type: Option<String>,
}

impl EquipmentDefinition {
    pub fn is_weapon(&self) -> bool {
        self.weapon_type.is_some()
    }
}

/// Problems found while loading or validating definition tables.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("definition JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("recipe table references unknown skill `{0}`")]
    RecipeForUnknownSkill(String),
    #[error("action `{0}` has a non-positive base interval")]
    NonPositiveInterval(String),
    #[error("equipment entry `{key}` declares mismatched item id `{item_id}`")]
    EquipmentKeyMismatch { key: String, item_id: String },
}

/// The full immutable content table a game instance runs on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionSet {
    /// Skill id to its action.
    pub actions: BTreeMap<String, ActionDefinition>,
    /// Skill id to recipe id to recipe.
    #[serde(default)]
    pub recipes: BTreeMap<String, BTreeMap<String, RecipeDefinition>>,
    /// Item id to equipment definition.
    #[serde(default)]
    pub equipment: BTreeMap<String, EquipmentDefinition>,
    /// Sell value table for plain resource items.
    #[serde(default)]
    pub resource_values: BTreeMap<String, u64>,
}

impl DefinitionSet {
    /// Parse and validate a definition table from JSON.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// Cross-reference checks that catch broken content before it reaches
    /// the simulation.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for skill_id in self.recipes.keys() {
            if !self.actions.contains_key(skill_id) {
                return Err(DefinitionError::RecipeForUnknownSkill(skill_id.clone()));
            }
        }
        for (skill_id, action) in &self.actions {
            if action.base_interval_ms <= 0.0 {
                return Err(DefinitionError::NonPositiveInterval(skill_id.clone()));
            }
        }
        for (key, equipment) in &self.equipment {
            if key != &equipment.item_id {
                return Err(DefinitionError::EquipmentKeyMismatch {
                    key: key.clone(),
                    item_id: equipment.item_id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn action(&self, skill_id: &str) -> Option<&ActionDefinition> {
        self.actions.get(skill_id)
    }

    pub fn recipe(&self, skill_id: &str, recipe_id: &str) -> Option<&RecipeDefinition> {
        self.recipes.get(skill_id)?.get(recipe_id)
    }

    pub fn recipes_for(&self, skill_id: &str) -> Option<&BTreeMap<String, RecipeDefinition>> {
        self.recipes.get(skill_id)
    }

    pub fn equipment(&self, item_id: &str) -> Option<&EquipmentDefinition> {
        self.equipment.get(item_id)
    }

    /// Sell value for any item id. Gold is never sellable; equipment is
    /// priced from its modifiers; plain resources come from the table,
    /// defaulting to 1 for ids the table does not know.
    pub fn sell_value(&self, item_id: &str) -> u64 {
        if item_id == GOLD_ITEM_ID {
            return 0;
        }
        if let Some(equipment) = self.equipment.get(item_id) {
            return equipment_sell_value(equipment.is_weapon(), &equipment.modifiers);
        }
        self.resource_values.get(item_id).copied().unwrap_or(1)
    }

    /// Costs armed by selecting `recipe_id` under `skill_id`, falling back
    /// to the action's defaults when the recipe declares none.
    pub fn armed_costs<'a>(
        &'a self,
        action: &'a ActionDefinition,
        recipe: Option<&'a RecipeDefinition>,
    ) -> &'a BTreeMap<String, u64> {
        recipe
            .and_then(|r| r.item_costs.as_ref())
            .unwrap_or(&action.item_costs)
    }
}

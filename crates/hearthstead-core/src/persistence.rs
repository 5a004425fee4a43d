//! Save/Load for the full game state.
//!
//! Uses bincode for compact binary serialization. Characters are written
//! as plain records and respawned on load. Loading is deliberately
//! forgiving: fields the current definition tables no longer recognize
//! are dropped with a warning, out-of-range values are clamped back to
//! their invariants, and content added since the save was written is
//! seeded with definition defaults. A load only fails when the bytes
//! themselves are unreadable or the format version moved.

use crate::components::{
    ActionState, Attributes, CharacterId, Identity, Loadout, SkillBook, Stamina,
};
use crate::definitions::{DefinitionSet, EquipSlot};
use crate::engine::{Engine, EngineConfig};
use crate::inventory::Inventory;
use hearthstead_logic::stats::RawStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use thiserror::Error;
use tracing::warn;

/// Version number for the save format (increment when the format changes)
const SAVE_VERSION: u32 = 1;

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Serializable snapshot of the whole game state
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub roster_limit: u32,
    pub next_character_id: u32,
    pub last_tick_ms: Option<f64>,
    pub inventory: BTreeMap<String, u64>,
    pub characters: Vec<CharacterSave>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CharacterSave {
    pub id: u32,
    pub name: String,
    pub stamina: f64,
    pub stamina_max: f64,
    pub allocated: RawStats,
    pub loadout: BTreeMap<EquipSlot, String>,
    pub selected_action: Option<String>,
    pub current_interval_ms: f64,
    pub skills: BTreeMap<String, SkillSave>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SkillSave {
    pub level: u32,
    pub xp: f64,
    pub xp_next: f64,
    pub base_interval_ms: f64,
    pub selected_recipe: Option<String>,
    pub recipes: BTreeMap<String, TrackSave>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TrackSave {
    pub level: u32,
    pub xp: f64,
    pub xp_next: f64,
}

impl Engine {
    /// Write the complete game state to a writer.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        let mut characters = Vec::new();
        for (_, (identity, attributes, loadout, stamina, book, action_state)) in self
            .world
            .query::<(
                &Identity,
                &Attributes,
                &Loadout,
                &Stamina,
                &SkillBook,
                &ActionState,
            )>()
            .iter()
        {
            characters.push(CharacterSave {
                id: identity.id.0,
                name: identity.name.clone(),
                stamina: stamina.current,
                stamina_max: stamina.max,
                allocated: attributes.allocated.clone(),
                loadout: loadout.slots.clone(),
                selected_action: action_state.selected.clone(),
                current_interval_ms: action_state.current_interval_ms,
                skills: book
                    .skills
                    .iter()
                    .map(|(skill_id, skill)| {
                        (
                            skill_id.clone(),
                            SkillSave {
                                level: skill.progress.level,
                                xp: skill.progress.xp,
                                xp_next: skill.progress.xp_next,
                                base_interval_ms: skill.base_interval_ms,
                                selected_recipe: skill.selected_recipe.clone(),
                                recipes: skill
                                    .recipes
                                    .iter()
                                    .map(|(recipe_id, track)| {
                                        (
                                            recipe_id.clone(),
                                            TrackSave {
                                                level: track.level,
                                                xp: track.xp,
                                                xp_next: track.xp_next,
                                            },
                                        )
                                    })
                                    .collect(),
                            },
                        )
                    })
                    .collect(),
            });
        }
        characters.sort_by_key(|character| character.id);

        let data = SaveData {
            version: SAVE_VERSION,
            roster_limit: self.roster_limit,
            next_character_id: self.next_character_id,
            last_tick_ms: self.last_tick_ms,
            inventory: self.inventory.to_map(),
            characters,
        };
        bincode::serialize_into(writer, &data)?;
        Ok(())
    }

    /// Rebuild an engine from saved bytes against the current definition
    /// tables. See the module docs for the recovery rules.
    pub fn load<R: Read>(
        defs: DefinitionSet,
        config: EngineConfig,
        reader: R,
    ) -> Result<Self, SaveError> {
        let data: SaveData = bincode::deserialize_from(reader)?;
        if data.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: data.version,
            });
        }

        let mut engine = Engine::new(defs, config);
        engine.roster_limit = data.roster_limit.clamp(1, engine.config.roster_max_size);
        engine.last_tick_ms = data.last_tick_ms;
        engine.inventory = Inventory::from_map(data.inventory);

        let mut highest_id = 0;
        for saved in data.characters {
            let id = if saved.id == 0 { highest_id + 1 } else { saved.id };
            highest_id = highest_id.max(id);
            let (identity, attributes, loadout, stamina, book, action_state) =
                restore_character(&engine.defs, &engine.config, id, saved);
            engine
                .world
                .spawn((identity, attributes, loadout, stamina, book, action_state));
        }
        engine.next_character_id = data.next_character_id.max(highest_id + 1);
        Ok(engine)
    }
}

/// Rebuild one character's components from a saved record, clamping and
/// defaulting anything the current definitions disagree with.
fn restore_character(
    defs: &DefinitionSet,
    config: &EngineConfig,
    id: u32,
    saved: CharacterSave,
) -> (Identity, Attributes, Loadout, Stamina, SkillBook, ActionState) {
    let identity = Identity {
        id: CharacterId(id),
        name: if saved.name.is_empty() {
            "Adventurer".to_string()
        } else {
            saved.name
        },
    };

    let mut stamina = Stamina {
        current: saved.stamina,
        max: if saved.stamina_max > 0.0 {
            saved.stamina_max
        } else {
            config.default_stamina_max
        },
    };
    stamina.clamp();

    // Start from freshly seeded skills so content added since the save
    // gets its defaults, then overlay whatever the save knows.
    let mut book = SkillBook::seeded(defs);
    for (skill_id, skill_save) in saved.skills {
        let Some(state) = book.get_mut(&skill_id) else {
            warn!(skill = %skill_id, "save references unknown skill, dropping");
            continue;
        };
        state.progress.level = skill_save.level.clamp(1, state.progress.max_level);
        state.progress.xp = skill_save.xp.max(0.0);
        if skill_save.xp_next >= 1.0 {
            state.progress.xp_next = skill_save.xp_next;
        }
        if state.progress.is_capped() {
            state.progress.xp = state.progress.xp.min(state.progress.xp_next);
        }
        if skill_save.base_interval_ms > 0.0 {
            state.base_interval_ms = skill_save.base_interval_ms;
        }
        state.selected_recipe = skill_save.selected_recipe.filter(|recipe_id| {
            let known = state.recipes.contains_key(recipe_id);
            if !known {
                warn!(skill = %skill_id, recipe = %recipe_id, "save selects unknown recipe, clearing");
            }
            known
        });
        for (recipe_id, track_save) in skill_save.recipes {
            let Some(track) = state.recipes.get_mut(&recipe_id) else {
                warn!(skill = %skill_id, recipe = %recipe_id, "save references unknown recipe, dropping");
                continue;
            };
            track.level = track_save.level.clamp(1, track.max_level);
            track.xp = track_save.xp.max(0.0);
            if track_save.xp_next >= 1.0 {
                track.xp_next = track_save.xp_next;
            }
            if track.is_capped() {
                track.xp = track.xp.min(track.xp_next);
            }
        }
    }

    let mut loadout = Loadout::default();
    for (slot, item_id) in saved.loadout {
        match defs.equipment(&item_id) {
            Some(equipment) if equipment.slot == slot => {
                loadout.equip(slot, item_id);
            }
            _ => warn!(item = %item_id, "save references unknown or mis-slotted equipment, dropping"),
        }
    }

    let selected = saved.selected_action.filter(|skill_id| {
        let known = defs.action(skill_id).is_some() && book.get(skill_id).is_some();
        if !known {
            warn!(skill = %skill_id, "save arms unknown action, disarming");
        }
        known
    });
    let action_state = ActionState {
        selected,
        current_interval_ms: saved.current_interval_ms.max(0.0),
        progress: 0.0,
        slack: Default::default(),
    };

    (
        identity,
        Attributes {
            allocated: saved.allocated,
        },
        loadout,
        stamina,
        book,
        action_state,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{ActionDefinition, EquipmentDefinition, RecipeDefinition};
    use hearthstead_logic::stats::{Stat, StatModifier};

    fn defs() -> DefinitionSet {
        let mut actions = BTreeMap::new();
        actions.insert(
            "cooking".to_string(),
            ActionDefinition {
                skill_id: "cooking".to_string(),
                name: "Cooking".to_string(),
                base_interval_ms: 2_000.0,
                item_costs: BTreeMap::new(),
                item_rewards: [("meal".to_string(), 1)].into_iter().collect(),
                gold_reward: 1,
                xp_skill: 1.0,
                xp_recipe: 2.0,
                stamina_cost: 5.0,
                stun_time_ms: 1_000.0,
                gold_multiplier: 1.0,
                xp_multiplier: 1.0,
                stamina_multiplier: 1.0,
                intellect_bonus: true,
                max_level: 99,
                xp_next_base: 10.0,
            },
        );
        let mut cooking = BTreeMap::new();
        cooking.insert(
            "fish_stew".to_string(),
            RecipeDefinition {
                recipe_id: "fish_stew".to_string(),
                name: "Fish Stew".to_string(),
                unlock_level: 1,
                item_costs: None,
                item_rewards: None,
                gold_reward: None,
                max_level: 50,
                xp_next_base: 10.0,
            },
        );
        let mut recipes = BTreeMap::new();
        recipes.insert("cooking".to_string(), cooking);
        let mut equipment = BTreeMap::new();
        equipment.insert(
            "copper_ladle".to_string(),
            EquipmentDefinition {
                item_id: "copper_ladle".to_string(),
                name: "Copper Ladle".to_string(),
                slot: EquipSlot::MainHand,
                modifiers: vec![StatModifier::flat(Stat::Intellect, 2.0)],
                weapon_type: None,
            },
        );
        DefinitionSet {
            actions,
            recipes,
            equipment,
            resource_values: BTreeMap::new(),
        }
    }

    fn populated_engine() -> Engine {
        let mut engine = Engine::new(defs(), EngineConfig::default());
        let id = engine.add_character("Rowan").unwrap();
        engine.inventory.grant("copper_ladle", 1);
        engine.equip_item(id, "copper_ladle").unwrap();
        engine.allocate_stat(id, Stat::Intellect, 4).unwrap();
        engine.select_recipe(id, "cooking", Some("fish_stew")).unwrap();
        engine.select_action(id, Some("cooking")).unwrap();
        engine.tick(0.0);
        for tick in 1..=40 {
            engine.tick(tick as f64 * 250.0);
        }
        engine
    }

    #[test]
    fn save_load_roundtrip_preserves_state() {
        let engine = populated_engine();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).expect("save failed");

        let loaded =
            Engine::load(defs(), EngineConfig::default(), &buffer[..]).expect("load failed");

        let before = engine.snapshot();
        let after = loaded.snapshot();
        assert_eq!(after.roster_size, before.roster_size);
        assert_eq!(after.inventory, before.inventory);
        assert_eq!(after.roster_limit, before.roster_limit);

        let hero_before = &before.characters[0];
        let hero_after = &after.characters[0];
        assert_eq!(hero_after.id, hero_before.id);
        assert_eq!(hero_after.name, hero_before.name);
        assert!((hero_after.stamina - hero_before.stamina).abs() < 1e-9);
        assert_eq!(hero_after.selected_action, hero_before.selected_action);
        let cooking_before = &hero_before.skills["cooking"];
        let cooking_after = &hero_after.skills["cooking"];
        assert_eq!(cooking_after.level, cooking_before.level);
        assert!((cooking_after.xp - cooking_before.xp).abs() < 1e-9);
        assert_eq!(
            cooking_after.recipes["fish_stew"].level,
            cooking_before.recipes["fish_stew"].level
        );
        assert_eq!(hero_after.modifier_audit.len(), 1);
    }

    #[test]
    fn loaded_engine_keeps_progressing() {
        let engine = populated_engine();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();
        let mut loaded = Engine::load(defs(), EngineConfig::default(), &buffer[..]).unwrap();

        let meals_before = loaded.inventory.count("meal");
        let last = loaded.last_tick_ms.unwrap();
        for tick in 1..=8 {
            loaded.tick(last + tick as f64 * 250.0);
        }
        assert!(loaded.inventory.count("meal") > meals_before);
    }

    #[test]
    fn malformed_fields_recover_to_defaults() {
        let mut skills = BTreeMap::new();
        skills.insert(
            "cooking".to_string(),
            SkillSave {
                level: 500,
                xp: -20.0,
                xp_next: 0.0,
                base_interval_ms: -1.0,
                selected_recipe: Some("dragon_feast".to_string()),
                recipes: [(
                    "phantom_recipe".to_string(),
                    TrackSave {
                        level: 3,
                        xp: 1.0,
                        xp_next: 15.0,
                    },
                )]
                .into_iter()
                .collect(),
            },
        );
        skills.insert("alchemy".to_string(), SkillSave::default());

        let data = SaveData {
            version: SAVE_VERSION,
            roster_limit: 99,
            next_character_id: 0,
            last_tick_ms: None,
            inventory: [("meal".to_string(), 3)].into_iter().collect(),
            characters: vec![CharacterSave {
                id: 7,
                name: String::new(),
                stamina: 5_000.0,
                stamina_max: -10.0,
                allocated: RawStats::new(),
                loadout: [(EquipSlot::Trinket, "copper_ladle".to_string())]
                    .into_iter()
                    .collect(),
                selected_action: Some("alchemy".to_string()),
                current_interval_ms: -300.0,
                skills,
            }],
        };
        let mut buffer = Vec::new();
        bincode::serialize_into(&mut buffer, &data).unwrap();

        let engine = Engine::load(defs(), EngineConfig::default(), &buffer[..]).unwrap();
        let snapshot = engine.snapshot();

        // Roster limit clamps to the configured maximum.
        assert!(snapshot.roster_limit <= EngineConfig::default().roster_max_size);

        let hero = &snapshot.characters[0];
        assert_eq!(hero.name, "Adventurer");
        // Stamina rebuilt from the default pool and clamped into range.
        assert!(hero.stamina <= hero.stamina_max);
        assert!(hero.stamina_max > 0.0);
        // Unknown action disarmed, unknown recipe cleared, level capped.
        assert_eq!(hero.selected_action, None);
        let cooking = &hero.skills["cooking"];
        assert_eq!(cooking.level, 99);
        assert_eq!(cooking.selected_recipe, None);
        assert!(!cooking.recipes.contains_key("phantom_recipe"));
        // Mis-slotted equipment dropped.
        assert!(hero.modifier_audit.is_empty());
        // Unknown skill dropped entirely, known content reseeded.
        assert!(!hero.skills.contains_key("alchemy"));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let data = SaveData {
            version: SAVE_VERSION + 1,
            roster_limit: 1,
            next_character_id: 1,
            last_tick_ms: None,
            inventory: BTreeMap::new(),
            characters: Vec::new(),
        };
        let mut buffer = Vec::new();
        bincode::serialize_into(&mut buffer, &data).unwrap();

        match Engine::load(defs(), EngineConfig::default(), &buffer[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, SAVE_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn truncated_bytes_error_cleanly() {
        let engine = populated_engine();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(matches!(
            Engine::load(defs(), EngineConfig::default(), &buffer[..]),
            Err(SaveError::Encoding(_))
        ));
    }
}

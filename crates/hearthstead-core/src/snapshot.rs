//! Read-only state snapshots.
//!
//! The interface layer never touches the world directly; it renders from
//! a snapshot taken between ticks. Snapshots are plain serializable data
//! with no entity handles, so they cross any boundary (JSON bridge,
//! worker message, test assertion) unchanged.

use crate::components::CharacterId;
use crate::engine::Engine;
use crate::scheduler::LoopTelemetry;
use crate::systems::resolve_character_stats;
use hearthstead_logic::catchup::CatchupSummary;
use hearthstead_logic::stats::{ModifierKind, Stat};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub characters: Vec<CharacterSnapshot>,
    pub inventory: BTreeMap<String, u64>,
    pub roster_limit: u32,
    pub roster_size: u32,
    /// Price of the next roster slot, absent at the hard cap.
    pub next_roster_slot_cost: Option<u64>,
    pub telemetry: LoopTelemetry,
    /// Present until the host consumes it via
    /// [`Engine::take_offline_summary`].
    pub offline_summary: Option<CatchupSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterSnapshot {
    pub id: CharacterId,
    pub name: String,
    pub stamina: f64,
    pub stamina_max: f64,
    pub selected_action: Option<String>,
    /// Fill fraction of the current action cycle.
    pub progress: f64,
    pub equipment: Vec<EquipmentLine>,
    pub effective_stats: Vec<StatLine>,
    /// Why each stat is what it is, one line per applied modifier.
    pub modifier_audit: Vec<ModifierLine>,
    pub skills: BTreeMap<String, SkillSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentLine {
    pub slot: crate::definitions::EquipSlot,
    pub item_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatLine {
    pub stat: Stat,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModifierLine {
    /// Stable identity: `itemId:stat:index`.
    pub id: String,
    pub source: String,
    pub stat: Stat,
    pub kind: ModifierKind,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillSnapshot {
    pub level: u32,
    pub xp: f64,
    pub xp_next: f64,
    pub max_level: u32,
    pub base_interval_ms: f64,
    pub selected_recipe: Option<String>,
    pub recipes: BTreeMap<String, TrackSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSnapshot {
    pub level: u32,
    pub xp: f64,
    pub xp_next: f64,
    pub max_level: u32,
}

impl Engine {
    /// A consistent view of everything the interface renders. Taken
    /// between ticks it never observes a partial update.
    pub fn snapshot(&self) -> EngineSnapshot {
        use crate::components::{
            ActionState, Attributes, Identity, Loadout, SkillBook, Stamina,
        };

        let now_ms = self.telemetry.last_tick_ms;
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
            let effective = resolve_character_stats(attributes, loadout, &self.defs, now_ms);
            characters.push(CharacterSnapshot {
                id: identity.id,
                name: identity.name.clone(),
                stamina: stamina.current,
                stamina_max: stamina.max,
                selected_action: action_state.selected.clone(),
                progress: action_state.progress,
                equipment: loadout
                    .slots
                    .iter()
                    .map(|(slot, item_id)| EquipmentLine {
                        slot: *slot,
                        item_id: item_id.clone(),
                    })
                    .collect(),
                effective_stats: effective
                    .values()
                    .map(|(stat, value)| StatLine { stat, value })
                    .collect(),
                modifier_audit: effective
                    .audit
                    .iter()
                    .map(|modifier| ModifierLine {
                        id: modifier.id.clone(),
                        source: modifier.source.clone(),
                        stat: modifier.stat,
                        kind: modifier.kind,
                        value: modifier.value,
                    })
                    .collect(),
                skills: book
                    .skills
                    .iter()
                    .map(|(skill_id, skill)| {
                        (
                            skill_id.clone(),
                            SkillSnapshot {
                                level: skill.progress.level,
                                xp: skill.progress.xp,
                                xp_next: skill.progress.xp_next,
                                max_level: skill.progress.max_level,
                                base_interval_ms: skill.base_interval_ms,
                                selected_recipe: skill.selected_recipe.clone(),
                                recipes: skill
                                    .recipes
                                    .iter()
                                    .map(|(recipe_id, track)| {
                                        (
                                            recipe_id.clone(),
                                            TrackSnapshot {
                                                level: track.level,
                                                xp: track.xp,
                                                xp_next: track.xp_next,
                                                max_level: track.max_level,
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

        EngineSnapshot {
            characters,
            inventory: self.inventory.to_map(),
            roster_limit: self.roster_limit,
            roster_size: self.roster_size(),
            next_roster_slot_cost: self.next_roster_slot_cost(),
            telemetry: self.telemetry,
            offline_summary: self.offline_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{
        ActionDefinition, DefinitionSet, EquipSlot, EquipmentDefinition, RecipeDefinition,
    };
    use crate::engine::EngineConfig;
    use hearthstead_logic::stats::StatModifier;

    fn defs() -> DefinitionSet {
        let mut actions = BTreeMap::new();
        actions.insert(
            "fishing".to_string(),
            ActionDefinition {
                skill_id: "fishing".to_string(),
                name: "Fishing".to_string(),
                base_interval_ms: 2_000.0,
                item_costs: BTreeMap::new(),
                item_rewards: [("raw_fish".to_string(), 1)].into_iter().collect(),
                gold_reward: 1,
                xp_skill: 1.0,
                xp_recipe: 1.0,
                stamina_cost: 0.0,
                stun_time_ms: 1_000.0,
                gold_multiplier: 1.0,
                xp_multiplier: 1.0,
                stamina_multiplier: 1.0,
                intellect_bonus: false,
                max_level: 99,
                xp_next_base: 10.0,
            },
        );
        let mut fishing = BTreeMap::new();
        fishing.insert(
            "river_perch".to_string(),
            RecipeDefinition {
                recipe_id: "river_perch".to_string(),
                name: "River Perch".to_string(),
                unlock_level: 1,
                item_costs: None,
                item_rewards: None,
                gold_reward: None,
                max_level: 50,
                xp_next_base: 10.0,
            },
        );
        let mut recipes = BTreeMap::new();
        recipes.insert("fishing".to_string(), fishing);
        let mut equipment = BTreeMap::new();
        equipment.insert(
            "river_rod".to_string(),
            EquipmentDefinition {
                item_id: "river_rod".to_string(),
                name: "River Rod".to_string(),
                slot: EquipSlot::MainHand,
                modifiers: vec![StatModifier::flat(Stat::Agility, 4.0)],
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

    #[test]
    fn snapshot_reflects_roster_and_audit() {
        let mut engine = Engine::new(defs(), EngineConfig::default());
        let id = engine.add_character("Rowan").unwrap();
        engine.inventory.grant("river_rod", 1);
        engine.equip_item(id, "river_rod").unwrap();
        engine.select_recipe(id, "fishing", Some("river_perch")).unwrap();
        engine.select_action(id, Some("fishing")).unwrap();
        engine.tick(0.0);
        engine.tick(250.0);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.roster_size, 1);
        assert_eq!(snapshot.characters.len(), 1);

        let hero = &snapshot.characters[0];
        assert_eq!(hero.name, "Rowan");
        assert_eq!(hero.selected_action.as_deref(), Some("fishing"));
        assert!(hero.progress > 0.0);
        assert_eq!(hero.equipment.len(), 1);
        assert_eq!(hero.equipment[0].item_id, "river_rod");
        assert_eq!(hero.modifier_audit.len(), 1);
        assert_eq!(hero.modifier_audit[0].id, "river_rod:agility:0");
        let agility = hero
            .effective_stats
            .iter()
            .find(|line| line.stat == Stat::Agility)
            .unwrap();
        assert!((agility.value - 4.0).abs() < f64::EPSILON);
        assert_eq!(hero.skills["fishing"].selected_recipe.as_deref(), Some("river_perch"));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut engine = Engine::new(defs(), EngineConfig::default());
        engine.add_character("Rowan").unwrap();
        let snapshot = engine.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"characters\""));
        assert!(json.contains("Rowan"));
    }
}

//! The engine context.
//!
//! One explicit struct owns the world, the definition tables, the shared
//! inventory, and the loop bookkeeping. There is no global instance;
//! hosts construct as many engines as they like, which keeps multi-
//! instance testing and deterministic clock injection straightforward.
//!
//! All mutation happens synchronously inside a command or a tick, so a
//! snapshot taken between calls is always consistent.

use crate::components::{
    ActionState, Attributes, CharacterId, Identity, Loadout, SkillBook, Stamina,
};
use crate::definitions::{DefinitionSet, EquipSlot};
use crate::error::CommandError;
use crate::inventory::Inventory;
use crate::scheduler::{Clock, LoopTelemetry};
use crate::systems::{progression_system, replay_offline, CompletionEvent, TickContext};
use hearthstead_logic::catchup::CatchupSummary;
use hearthstead_logic::constants;
use hearthstead_logic::economy::{roster_slot_cost, sell_gold_gain};
use hearthstead_logic::leveling::LevelCurveConfig;
use hearthstead_logic::stats::Stat;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Engine tuning. Defaults mirror the shipped constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cadence the host is expected to tick at.
    pub loop_interval_ms: f64,
    /// Deltas beyond `loop_interval_ms * offline_threshold` replay as an
    /// offline gap instead of ticking.
    pub offline_threshold: f64,
    /// Coarse step for offline replay.
    pub offline_interval_ms: f64,
    pub min_action_interval_ms: f64,
    pub curve: LevelCurveConfig,
    pub default_stamina_max: f64,
    pub roster_base_cost: f64,
    pub roster_cost_growth: f64,
    pub roster_max_size: u32,
    pub starting_roster_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: constants::LOOP_INTERVAL_MS,
            offline_threshold: constants::OFFLINE_THRESHOLD,
            offline_interval_ms: constants::OFFLINE_INTERVAL_MS,
            min_action_interval_ms: constants::MIN_ACTION_INTERVAL_MS,
            curve: LevelCurveConfig::default(),
            default_stamina_max: constants::DEFAULT_STAMINA_MAX,
            roster_base_cost: constants::ROSTER_BASE_COST,
            roster_cost_growth: constants::ROSTER_COST_GROWTH,
            roster_max_size: constants::ROSTER_MAX_SIZE,
            starting_roster_limit: 1,
        }
    }
}

pub struct Engine {
    pub(crate) world: World,
    pub(crate) defs: DefinitionSet,
    pub(crate) config: EngineConfig,
    pub(crate) inventory: Inventory,
    pub(crate) roster_limit: u32,
    pub(crate) next_character_id: u32,
    pub(crate) last_tick_ms: Option<f64>,
    /// Guard against a tick firing while a replay is in flight.
    pub(crate) replaying: bool,
    pub(crate) telemetry: LoopTelemetry,
    pub(crate) offline_summary: Option<CatchupSummary>,
}

impl Engine {
    pub fn new(defs: DefinitionSet, config: EngineConfig) -> Self {
        Self {
            world: World::new(),
            inventory: Inventory::new(),
            roster_limit: config.starting_roster_limit.clamp(1, config.roster_max_size),
            next_character_id: 1,
            last_tick_ms: None,
            replaying: false,
            telemetry: LoopTelemetry::default(),
            offline_summary: None,
            defs,
            config,
        }
    }

    // ── Roster commands ─────────────────────────────────────────────

    pub fn add_character(&mut self, name: &str) -> Result<CharacterId, CommandError> {
        if self.roster_size() >= self.roster_limit {
            return Err(CommandError::RosterFull(self.roster_limit));
        }
        let id = CharacterId(self.next_character_id);
        self.next_character_id += 1;
        let book = SkillBook::seeded(&self.defs);
        self.world.spawn((
            Identity {
                id,
                name: name.to_string(),
            },
            Attributes::default(),
            Loadout::default(),
            Stamina::full(self.config.default_stamina_max),
            book,
            ActionState::default(),
        ));
        info!(character = %id, name, "character recruited");
        Ok(id)
    }

    pub fn rename_character(&mut self, id: CharacterId, name: &str) -> Result<(), CommandError> {
        let entity = self.find_character(id)?;
        let mut identity = self
            .world
            .get::<&mut Identity>(entity)
            .map_err(|_| CommandError::UnknownCharacter(id.0))?;
        identity.name = name.to_string();
        Ok(())
    }

    pub fn allocate_stat(
        &mut self,
        id: CharacterId,
        stat: Stat,
        points: u32,
    ) -> Result<(), CommandError> {
        let entity = self.find_character(id)?;
        let mut attributes = self
            .world
            .get::<&mut Attributes>(entity)
            .map_err(|_| CommandError::UnknownCharacter(id.0))?;
        attributes.allocate(stat, points);
        Ok(())
    }

    /// Raise the roster limit by one, paying the current slot price.
    pub fn buy_roster_slot(&mut self) -> Result<u32, CommandError> {
        if self.roster_limit >= self.config.roster_max_size {
            return Err(CommandError::RosterAtMax(self.config.roster_max_size));
        }
        let price = roster_slot_cost(
            self.roster_limit,
            self.config.roster_base_cost,
            self.config.roster_cost_growth,
        );
        if !self.inventory.spend_gold(price) {
            return Err(CommandError::NotEnoughGold {
                need: price,
                have: self.inventory.gold(),
            });
        }
        self.roster_limit += 1;
        info!(limit = self.roster_limit, price, "roster slot purchased");
        Ok(self.roster_limit)
    }

    /// Price of the next roster slot, or `None` at the hard cap.
    pub fn next_roster_slot_cost(&self) -> Option<u64> {
        (self.roster_limit < self.config.roster_max_size).then(|| {
            roster_slot_cost(
                self.roster_limit,
                self.config.roster_base_cost,
                self.config.roster_cost_growth,
            )
        })
    }

    // ── Selection commands ──────────────────────────────────────────

    /// The arming gate: the character must know the skill and the
    /// inventory must cover the costs the selection would arm. A locked
    /// recipe is not a blocker here; it just leaves the action inert.
    pub fn can_start_action(&self, id: CharacterId, skill_id: &str) -> Result<(), CommandError> {
        let entity = self.find_character(id)?;
        let book = self
            .world
            .get::<&SkillBook>(entity)
            .map_err(|_| CommandError::UnknownCharacter(id.0))?;
        let state = book
            .get(skill_id)
            .ok_or_else(|| CommandError::UnknownSkill(skill_id.to_string()))?;
        let action = self
            .defs
            .action(skill_id)
            .ok_or_else(|| CommandError::UnknownSkill(skill_id.to_string()))?;
        let recipe = state
            .selected_recipe
            .as_deref()
            .and_then(|recipe_id| self.defs.recipe(skill_id, recipe_id));
        if !self.inventory.can_afford(self.defs.armed_costs(action, recipe)) {
            return Err(CommandError::InsufficientResources(skill_id.to_string()));
        }
        Ok(())
    }

    /// Arm an action, or disarm with `None`. Arming resets the cycle.
    pub fn select_action(
        &mut self,
        id: CharacterId,
        skill: Option<&str>,
    ) -> Result<(), CommandError> {
        let entity = self.find_character(id)?;
        if let Some(skill_id) = skill {
            self.can_start_action(id, skill_id)?;
        }
        let mut action_state = self
            .world
            .get::<&mut ActionState>(entity)
            .map_err(|_| CommandError::UnknownCharacter(id.0))?;
        action_state.arm(skill.map(str::to_string));
        Ok(())
    }

    /// Choose a recipe for a skill, or clear it with `None`. Selecting an
    /// under-leveled recipe is allowed; the action idles until the skill
    /// reaches the unlock level.
    pub fn select_recipe(
        &mut self,
        id: CharacterId,
        skill_id: &str,
        recipe: Option<&str>,
    ) -> Result<(), CommandError> {
        let entity = self.find_character(id)?;
        if let Some(recipe_id) = recipe {
            self.defs
                .recipe(skill_id, recipe_id)
                .ok_or_else(|| CommandError::UnknownRecipe {
                    skill: skill_id.to_string(),
                    recipe: recipe_id.to_string(),
                })?;
        }
        {
            let mut book = self
                .world
                .get::<&mut SkillBook>(entity)
                .map_err(|_| CommandError::UnknownCharacter(id.0))?;
            let state = book
                .get_mut(skill_id)
                .ok_or_else(|| CommandError::UnknownSkill(skill_id.to_string()))?;
            state.selected_recipe = recipe.map(str::to_string);
        }
        // Switching output restarts the cycle in progress.
        if let Ok(mut action_state) = self.world.get::<&mut ActionState>(entity) {
            if action_state.selected.as_deref() == Some(skill_id) {
                action_state.current_interval_ms = 0.0;
                action_state.progress = 0.0;
            }
        }
        Ok(())
    }

    // ── Loadout commands ────────────────────────────────────────────

    /// Equip an owned item into the slot its definition names. Equipment
    /// is referenced, not consumed; the inventory count is untouched.
    pub fn equip_item(&mut self, id: CharacterId, item_id: &str) -> Result<(), CommandError> {
        let entity = self.find_character(id)?;
        let equipment = self
            .defs
            .equipment(item_id)
            .ok_or_else(|| CommandError::UnknownItem(item_id.to_string()))?;
        if !self.inventory.has(item_id, 1) {
            return Err(CommandError::ItemNotOwned(item_id.to_string()));
        }
        let mut loadout = self
            .world
            .get::<&mut Loadout>(entity)
            .map_err(|_| CommandError::UnknownCharacter(id.0))?;
        loadout.equip(equipment.slot, item_id);
        Ok(())
    }

    /// Clear a slot, returning the item id that was there.
    pub fn unequip_slot(
        &mut self,
        id: CharacterId,
        slot: EquipSlot,
    ) -> Result<String, CommandError> {
        let entity = self.find_character(id)?;
        let mut loadout = self
            .world
            .get::<&mut Loadout>(entity)
            .map_err(|_| CommandError::UnknownCharacter(id.0))?;
        loadout.unequip(slot).ok_or(CommandError::SlotEmpty(slot))
    }

    // ── Economy commands ────────────────────────────────────────────

    /// Sell `count` units of an item for gold. When the last copy of an
    /// equipped item leaves the inventory, the slots referencing it clear
    /// so no loadout dangles.
    pub fn sell_item(&mut self, item_id: &str, count: u64) -> Result<u64, CommandError> {
        if item_id == constants::GOLD_ITEM_ID {
            return Err(CommandError::NotSellable(item_id.to_string()));
        }
        if count == 0 {
            return Ok(0);
        }
        let owned = self.inventory.count(item_id);
        if owned < count {
            return Err(CommandError::NotEnoughItems {
                item: item_id.to_string(),
                requested: count,
                owned,
            });
        }
        let gain = sell_gold_gain(self.defs.sell_value(item_id), count as f64);
        self.inventory.consume(item_id, count);
        self.inventory.add_gold(gain);
        if self.inventory.count(item_id) == 0 {
            for (_, loadout) in self.world.query_mut::<&mut Loadout>() {
                loadout.clear_item(item_id);
            }
        }
        debug!(item = item_id, count, gain, "items sold");
        Ok(gain)
    }

    /// Developer command: deposit items directly into the shared
    /// inventory. Hosts expose this behind their debug console, next to
    /// [`Engine::simulate_offline`].
    pub fn grant_item(&mut self, item_id: &str, count: u64) {
        self.inventory.grant(item_id, count);
        debug!(item = item_id, count, "items granted");
    }

    // ── Save lifecycle ──────────────────────────────────────────────

    /// Destroy every character, the inventory, and all loop state. The
    /// definition tables and config survive.
    pub fn reset_save(&mut self) {
        self.world.clear();
        self.inventory = Inventory::new();
        self.roster_limit = self
            .config
            .starting_roster_limit
            .clamp(1, self.config.roster_max_size);
        self.next_character_id = 1;
        self.last_tick_ms = None;
        self.telemetry = LoopTelemetry::default();
        self.offline_summary = None;
        info!("save reset");
    }

    // ── The loop ────────────────────────────────────────────────────

    /// Advance the game to `now_ms`. A delta within the live window runs
    /// one normal tick; a longer one replays as an offline gap. Returns
    /// the completions the tick applied (replays report through the
    /// offline summary instead).
    pub fn tick(&mut self, now_ms: f64) -> Vec<CompletionEvent> {
        if self.replaying {
            return Vec::new();
        }
        let Some(previous) = self.last_tick_ms else {
            self.last_tick_ms = Some(now_ms);
            self.telemetry.last_tick_ms = now_ms;
            return Vec::new();
        };
        let delta_ms = (now_ms - previous).max(0.0);
        self.last_tick_ms = Some(now_ms);
        self.telemetry.last_tick_ms = now_ms;
        self.telemetry.last_delta_ms = delta_ms;
        self.telemetry.drift_ms = delta_ms - self.config.loop_interval_ms;

        if delta_ms > self.config.loop_interval_ms * self.config.offline_threshold {
            self.run_replay(now_ms, delta_ms);
            Vec::new()
        } else {
            let ctx = TickContext {
                defs: &self.defs,
                curve: self.config.curve,
                min_action_interval_ms: self.config.min_action_interval_ms,
                now_ms,
            };
            progression_system(&mut self.world, &mut self.inventory, &ctx, delta_ms)
        }
    }

    /// Convenience wrapper for hosts that own a clock. Reads the clock a
    /// second time to record the tick's processing duration.
    pub fn pump<C: Clock>(&mut self, clock: &C) -> Vec<CompletionEvent> {
        let start_ms = clock.now_ms();
        let events = self.tick(start_ms);
        self.telemetry.last_tick_duration_ms = clock.now_ms() - start_ms;
        events
    }

    /// Debug command: pretend `gap_ms` just elapsed and replay it.
    pub fn simulate_offline(&mut self, gap_ms: f64) {
        let now_ms = self.last_tick_ms.unwrap_or(0.0) + gap_ms.max(0.0);
        self.run_replay(now_ms, gap_ms.max(0.0));
        self.last_tick_ms = Some(now_ms);
        self.telemetry.last_tick_ms = now_ms;
    }

    fn run_replay(&mut self, now_ms: f64, gap_ms: f64) {
        info!(gap_ms, "offline gap detected, replaying");
        self.replaying = true;
        let ctx = TickContext {
            defs: &self.defs,
            curve: self.config.curve,
            min_action_interval_ms: self.config.min_action_interval_ms,
            now_ms,
        };
        let summary = replay_offline(
            &mut self.world,
            &mut self.inventory,
            &ctx,
            gap_ms,
            self.config.offline_interval_ms,
        );
        self.replaying = false;
        info!(
            completions = summary.completions,
            skipped = summary.loops_skipped,
            "offline replay finished"
        );
        self.offline_summary = Some(summary);
    }

    /// One-shot record of the last replay, for the welcome-back dialog.
    pub fn take_offline_summary(&mut self) -> Option<CatchupSummary> {
        self.offline_summary.take()
    }

    // ── Read access ─────────────────────────────────────────────────

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn definitions(&self) -> &DefinitionSet {
        &self.defs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &LoopTelemetry {
        &self.telemetry
    }

    pub fn roster_limit(&self) -> u32 {
        self.roster_limit
    }

    pub fn roster_size(&self) -> u32 {
        self.world.query::<&Identity>().iter().count() as u32
    }

    pub fn character_ids(&self) -> Vec<CharacterId> {
        let mut ids: Vec<CharacterId> = self
            .world
            .query::<&Identity>()
            .iter()
            .map(|(_, identity)| identity.id)
            .collect();
        ids.sort();
        ids
    }

    pub(crate) fn find_character(&self, id: CharacterId) -> Result<Entity, CommandError> {
        self.world
            .query::<&Identity>()
            .iter()
            .find(|(_, identity)| identity.id == id)
            .map(|(entity, _)| entity)
            .ok_or(CommandError::UnknownCharacter(id.0))
    }
}

//! The action progression step.
//!
//! One generic function advances any character's armed action, whatever
//! the skill: accumulate time, resolve the interval from stats, fire the
//! completion when the threshold is crossed, carry the overflow forward.
//! Completion effects run the whole pipeline: stamina and stun, dual
//! experience grants, leveling checks, and the inventory transaction.
//!
//! Cost sufficiency is a selection-time gate. The completion step applies
//! its deltas unconditionally, with saturating decrements keeping counts
//! non-negative.

use crate::components::{
    ActionState, Attributes, CharacterId, Identity, Loadout, SkillBook, SkillState, Stamina,
};
use crate::definitions::{ActionDefinition, DefinitionSet, RecipeDefinition};
use crate::inventory::Inventory;
use hearthstead_logic::leveling::{grant_xp, LevelCurveConfig};
use hearthstead_logic::stats::{
    action_interval_ms, resolve, xp_multiplier, EffectiveStats, ModifierSource, Stat,
};
use hecs::World;

/// Everything a progression step needs besides the character itself.
pub struct TickContext<'a> {
    pub defs: &'a DefinitionSet,
    pub curve: LevelCurveConfig,
    pub min_action_interval_ms: f64,
    pub now_ms: f64,
}

/// What one step did for one character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Nothing armed, or the armed selection cannot run.
    Idle,
    /// Time accrued but the threshold was not crossed. `remaining_ms` is
    /// negative: how far the accumulator still is from the interval.
    Progressed { remaining_ms: f64 },
    /// A completion fired. `overflow_ms` was carried into the next cycle.
    Completed { overflow_ms: f64 },
}

/// One applied completion, for the interface's activity log.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEvent {
    pub character: CharacterId,
    pub skill_id: String,
    pub recipe_id: String,
    pub gold_gained: u64,
    pub skill_xp: f64,
    pub recipe_xp: f64,
    /// New level when this completion leveled the skill.
    pub skill_level_up: Option<u32>,
    pub recipe_level_up: Option<u32>,
    /// The cycle paid a stun extension and stamina refilled.
    pub was_stunned: bool,
}

/// Effective stats for a character given its current loadout.
pub fn resolve_character_stats(
    attributes: &Attributes,
    loadout: &Loadout,
    defs: &DefinitionSet,
    now_ms: f64,
) -> EffectiveStats {
    let sources: Vec<ModifierSource<'_>> = loadout
        .item_ids()
        .filter_map(|item_id| defs.equipment(item_id))
        .map(|equipment| ModifierSource {
            item_id: &equipment.item_id,
            label: &equipment.name,
            modifiers: &equipment.modifiers,
        })
        .collect();
    resolve(&attributes.allocated, &sources, now_ms)
}

/// The armed action/recipe pair, if the character's selection can run.
/// A missing selection or a still-locked recipe is simply inert.
fn armed_selection<'a>(
    defs: &'a DefinitionSet,
    book: &SkillBook,
    action_state: &ActionState,
) -> Option<(&'a ActionDefinition, &'a RecipeDefinition)> {
    let skill_id = action_state.selected.as_deref()?;
    let action = defs.action(skill_id)?;
    let skill = book.get(skill_id)?;
    let recipe_id = skill.selected_recipe.as_deref()?;
    let recipe = defs.recipe(skill_id, recipe_id)?;
    (skill.progress.level >= recipe.unlock_level).then_some((action, recipe))
}

/// Advance one character by `delta_ms`.
#[allow(clippy::too_many_arguments)]
pub fn advance_character(
    id: CharacterId,
    attributes: &Attributes,
    loadout: &Loadout,
    stamina: &mut Stamina,
    book: &mut SkillBook,
    action_state: &mut ActionState,
    inventory: &mut Inventory,
    ctx: &TickContext<'_>,
    delta_ms: f64,
    events: &mut Vec<CompletionEvent>,
) -> StepOutcome {
    let Some((action, recipe)) = armed_selection(ctx.defs, book, action_state) else {
        return StepOutcome::Idle;
    };

    action_state.current_interval_ms += delta_ms.max(0.0);

    let effective = resolve_character_stats(attributes, loadout, ctx.defs, ctx.now_ms);
    let mut interval = action_interval_ms(
        book.get(&action.skill_id)
            .map(|s| s.base_interval_ms)
            .unwrap_or(action.base_interval_ms),
        effective.get(Stat::Agility),
        ctx.min_action_interval_ms,
    );
    if stamina.is_empty() {
        interval += action.stun_time_ms;
    }

    if action_state.current_interval_ms < interval {
        action_state.progress = (action_state.current_interval_ms / interval).clamp(0.0, 1.0);
        return StepOutcome::Progressed {
            remaining_ms: action_state.current_interval_ms - interval,
        };
    }

    // Threshold crossed. The overflow stays banked toward the next cycle
    // so long ticks never lose fractional progress.
    let overflow_ms = action_state.current_interval_ms - interval;
    action_state.current_interval_ms = overflow_ms;
    action_state.progress = 1.0;

    let skill_id = action.skill_id.clone();
    if let Some(skill) = book.get_mut(&skill_id) {
        let event = apply_completion(id, action, recipe, &effective, stamina, skill, inventory, ctx);
        events.push(event);
    }

    StepOutcome::Completed { overflow_ms }
}

/// Apply one completion outside the normal threshold path. Used by the
/// offline replayer, which forces a completion per executed coarse step
/// and charges the unmet remainder to the character's slack bucket.
#[allow(clippy::too_many_arguments)]
pub fn force_completion(
    id: CharacterId,
    attributes: &Attributes,
    loadout: &Loadout,
    stamina: &mut Stamina,
    book: &mut SkillBook,
    action_state: &mut ActionState,
    inventory: &mut Inventory,
    ctx: &TickContext<'_>,
    events: &mut Vec<CompletionEvent>,
) -> bool {
    let Some((action, recipe)) = armed_selection(ctx.defs, book, action_state) else {
        return false;
    };

    action_state.current_interval_ms = 0.0;
    action_state.progress = 1.0;

    let effective = resolve_character_stats(attributes, loadout, ctx.defs, ctx.now_ms);
    let skill_id = action.skill_id.clone();
    if let Some(skill) = book.get_mut(&skill_id) {
        let event = apply_completion(id, action, recipe, &effective, stamina, skill, inventory, ctx);
        events.push(event);
        true
    } else {
        false
    }
}

/// The completion pipeline shared by the live and forced paths.
#[allow(clippy::too_many_arguments)]
fn apply_completion(
    id: CharacterId,
    action: &ActionDefinition,
    recipe: &RecipeDefinition,
    effective: &EffectiveStats,
    stamina: &mut Stamina,
    skill: &mut SkillState,
    inventory: &mut Inventory,
    ctx: &TickContext<'_>,
) -> CompletionEvent {
    // A collapsed pool pays its stun through the extended interval that
    // led here, then refills before the normal drain.
    let was_stunned = stamina.is_empty();
    if was_stunned {
        stamina.refill();
    }
    stamina.drain(action.stamina_cost * action.stamina_multiplier);

    let intellect_scale = if action.intellect_bonus {
        xp_multiplier(effective.get(Stat::Intellect))
    } else {
        1.0
    };
    let skill_gain = action.xp_skill * action.xp_multiplier * intellect_scale;
    let recipe_gain = action.xp_recipe * action.xp_multiplier * intellect_scale;

    let skill_outcome = grant_xp(&mut skill.progress, skill_gain, &ctx.curve);
    let recipe_outcome = skill
        .recipes
        .get_mut(&recipe.recipe_id)
        .map(|track| grant_xp(track, recipe_gain, &ctx.curve))
        .unwrap_or_default();

    let gold = (recipe.gold_reward.unwrap_or(action.gold_reward) as f64 * action.gold_multiplier)
        .round()
        .max(0.0) as u64;
    let costs = recipe.item_costs.as_ref().unwrap_or(&action.item_costs);
    let rewards = recipe.item_rewards.as_ref().unwrap_or(&action.item_rewards);
    inventory.apply_completion(costs, rewards, gold);

    CompletionEvent {
        character: id,
        skill_id: action.skill_id.clone(),
        recipe_id: recipe.recipe_id.clone(),
        gold_gained: gold,
        skill_xp: skill_gain,
        recipe_xp: recipe_gain,
        skill_level_up: skill_outcome.leveled_up.then_some(skill_outcome.level),
        recipe_level_up: recipe_outcome.leveled_up.then_some(recipe_outcome.level),
        was_stunned,
    }
}

/// Advance every character with an armed action by `delta_ms`.
pub fn progression_system(
    world: &mut World,
    inventory: &mut Inventory,
    ctx: &TickContext<'_>,
    delta_ms: f64,
) -> Vec<CompletionEvent> {
    let mut events = Vec::new();
    for (_, (identity, attributes, loadout, stamina, book, action_state)) in world.query_mut::<(
        &Identity,
        &Attributes,
        &Loadout,
        &mut Stamina,
        &mut SkillBook,
        &mut ActionState,
    )>() {
        advance_character(
            identity.id,
            attributes,
            loadout,
            stamina,
            book,
            action_state,
            inventory,
            ctx,
            delta_ms,
            &mut events,
        );
    }
    events
}

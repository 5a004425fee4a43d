//! Offline catch-up replay.
//!
//! When the host was away, the elapsed gap is replayed in coarse steps
//! rather than live-sized ticks, so multi-hour absences cost bounded work.
//! Each executed step drives one completion for each active character even
//! when the action needed more time than the step covered; the unmet
//! remainder is charged to the character's slack bucket and paid back by
//! skipping later iterations. Total simulated action-time converges on
//! the real gap without fine-grained replay.
//!
//! The first coarse slice is never replayed: it is treated as covered by
//! the live tick that detected the gap.
//!
//! Replay emits no per-completion events. The returned summary is all the
//! interface shows for an absence.

use crate::components::{ActionState, Attributes, Identity, Loadout, SkillBook, Stamina};
use crate::inventory::Inventory;
use crate::systems::{advance_character, force_completion, StepOutcome, TickContext};
use hearthstead_logic::catchup::{CatchupPlan, CatchupSummary};
use hecs::World;
use tracing::debug;

/// Replay `elapsed_ms` of absence in steps of `step_ms`.
pub fn replay_offline(
    world: &mut World,
    inventory: &mut Inventory,
    ctx: &TickContext<'_>,
    elapsed_ms: f64,
    step_ms: f64,
) -> CatchupSummary {
    let plan = CatchupPlan::new(elapsed_ms, step_ms);
    let mut summary = CatchupSummary {
        elapsed_ms: plan.elapsed_ms,
        loop_count: plan.loop_count,
        ..Default::default()
    };

    // Slack is bookkeeping for a single replay window.
    for (_, action_state) in world.query_mut::<&mut ActionState>() {
        action_state.slack.reset();
    }

    let mut events = Vec::new();
    for _ in 1..plan.loop_count {
        for (_, (identity, attributes, loadout, stamina, book, action_state)) in world
            .query_mut::<(
                &Identity,
                &Attributes,
                &Loadout,
                &mut Stamina,
                &mut SkillBook,
                &mut ActionState,
            )>()
        {
            if action_state.selected.is_none() {
                continue;
            }
            if action_state.slack.consume_skip(plan.step_ms) {
                summary.loops_skipped += 1;
                continue;
            }
            match advance_character(
                identity.id,
                attributes,
                loadout,
                stamina,
                book,
                action_state,
                inventory,
                ctx,
                plan.step_ms,
                &mut events,
            ) {
                StepOutcome::Completed { .. } | StepOutcome::Idle => {}
                StepOutcome::Progressed { remaining_ms } => {
                    if force_completion(
                        identity.id,
                        attributes,
                        loadout,
                        stamina,
                        book,
                        action_state,
                        inventory,
                        ctx,
                        &mut events,
                    ) {
                        action_state.slack.charge(-remaining_ms);
                    }
                }
            }
        }
        summary.completions += events.len() as u64;
        events.clear();
    }

    summary.loops_executed = summary.loop_count.saturating_sub(summary.loops_skipped);
    debug!(
        elapsed_ms = summary.elapsed_ms,
        loops = summary.loop_count,
        skipped = summary.loops_skipped,
        completions = summary.completions,
        "offline replay applied"
    );
    summary
}

//! Hearthstead Headless Simulation Harness
//!
//! Validates the progression engine end to end without a UI. Runs
//! entirely in-process against a deterministic clock. No timers, no
//! rendering, no storage.
//!
//! Usage:
//!   cargo run -p hearthstead-simtest
//!   cargo run -p hearthstead-simtest -- --verbose

use hearthstead_core::definitions::{
    ActionDefinition, DefinitionSet, EquipSlot, RecipeDefinition,
};
use hearthstead_core::engine::{Engine, EngineConfig};
use hearthstead_core::error::CommandError;
use hearthstead_logic::economy::roster_slot_cost;
use hearthstead_logic::leveling::{grant_xp, LevelCurveConfig, ProgressTrack};
use hearthstead_logic::stats::Stat;
use std::collections::BTreeMap;

// ── Definition tables (same JSON a browser host ships) ──────────────────
const DEFINITIONS_JSON: &str = include_str!("../../../data/definitions.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("=== Hearthstead Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Definition tables
    results.extend(validate_definitions(verbose));

    // 2. Leveling curve
    results.extend(validate_leveling(verbose));

    // 3. Economy pricing
    results.extend(validate_economy(verbose));

    // 4. Live progression loop
    results.extend(validate_live_progression(verbose));

    // 5. Offline catch-up replay
    results.extend(validate_offline_catchup(verbose));

    // 6. Persistence round-trip
    results.extend(validate_persistence(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn shipped_defs() -> DefinitionSet {
    DefinitionSet::from_json(DEFINITIONS_JSON).expect("shipped definitions must parse")
}

/// A minimal table with a 2000ms zero-stamina action, used where exact
/// completion counts matter.
fn training_defs() -> DefinitionSet {
    let mut actions = BTreeMap::new();
    actions.insert(
        "drill".to_string(),
        ActionDefinition {
            skill_id: "drill".to_string(),
            name: "Drill".to_string(),
            base_interval_ms: 2_000.0,
            item_costs: BTreeMap::new(),
            item_rewards: [("token".to_string(), 1)].into_iter().collect(),
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
    let mut drill = BTreeMap::new();
    drill.insert(
        "basic_form".to_string(),
        RecipeDefinition {
            recipe_id: "basic_form".to_string(),
            name: "Basic Form".to_string(),
            unlock_level: 1,
            item_costs: None,
            item_rewards: None,
            gold_reward: None,
            max_level: 50,
            xp_next_base: 10.0,
        },
    );
    let mut recipes = BTreeMap::new();
    recipes.insert("drill".to_string(), drill);
    DefinitionSet {
        actions,
        recipes,
        equipment: BTreeMap::new(),
        resource_values: BTreeMap::new(),
    }
}

// ── 1. Definition tables ────────────────────────────────────────────────

fn validate_definitions(_verbose: bool) -> Vec<TestResult> {
    println!("--- Definition Tables ---");
    let mut results = Vec::new();

    let defs = match DefinitionSet::from_json(DEFINITIONS_JSON) {
        Ok(d) => d,
        Err(e) => {
            results.push(check("definitions_parse", false, format!("{}", e)));
            return results;
        }
    };

    results.push(check(
        "definitions_parse",
        true,
        format!(
            "{} skills, {} equipment items",
            defs.actions.len(),
            defs.equipment.len()
        ),
    ));

    let every_skill_has_recipes = defs
        .actions
        .keys()
        .all(|skill_id| defs.recipes_for(skill_id).map_or(false, |r| !r.is_empty()));
    results.push(check(
        "every_skill_has_recipes",
        every_skill_has_recipes,
        "each action has at least one recipe",
    ));

    let starter_recipe_per_skill = defs.actions.keys().all(|skill_id| {
        defs.recipes_for(skill_id)
            .map_or(false, |table| table.values().any(|r| r.unlock_level <= 1))
    });
    results.push(check(
        "starter_recipe_per_skill",
        starter_recipe_per_skill,
        "each skill is usable at level 1",
    ));

    let intellect_skills: Vec<&str> = defs
        .actions
        .values()
        .filter(|a| a.intellect_bonus)
        .map(|a| a.skill_id.as_str())
        .collect();
    results.push(check(
        "intellect_allow_list",
        !intellect_skills.is_empty(),
        format!("intellect skills: {}", intellect_skills.join(", ")),
    ));

    results
}

// ── 2. Leveling curve ───────────────────────────────────────────────────

fn validate_leveling(_verbose: bool) -> Vec<TestResult> {
    println!("--- Leveling Curve ---");
    let mut results = Vec::new();
    let curve = LevelCurveConfig::default();

    let mut track = ProgressTrack::new(10.0, 20);
    let mut thresholds = vec![track.xp_next];
    let mut invariant_held = true;
    while !track.is_capped() {
        let needed = track.xp_next;
        grant_xp(&mut track, needed, &curve);
        if !track.is_capped() && (track.xp < 0.0 || track.xp >= track.xp_next) {
            invariant_held = false;
        }
        thresholds.push(track.xp_next);
    }
    results.push(check(
        "xp_invariant_to_cap",
        invariant_held,
        "0 <= xp < xp_next below the cap",
    ));

    let monotonic = thresholds.windows(2).all(|pair| pair[1] >= pair[0]);
    results.push(check(
        "threshold_monotonic",
        monotonic,
        format!("{} thresholds, final {}", thresholds.len(), track.xp_next),
    ));

    let level_before = track.level;
    grant_xp(&mut track, 1_000_000.0, &curve);
    results.push(check(
        "cap_holds",
        track.level == level_before && track.xp <= track.xp_next,
        format!("level stays {} at cap", track.level),
    ));

    results
}

// ── 3. Economy pricing ──────────────────────────────────────────────────

fn validate_economy(_verbose: bool) -> Vec<TestResult> {
    println!("--- Economy ---");
    let mut results = Vec::new();
    let defs = shipped_defs();

    results.push(check(
        "gold_never_sellable",
        defs.sell_value("gold") == 0,
        "sell_value(gold) == 0",
    ));

    let axe = defs.sell_value("woodsman_axe");
    results.push(check(
        "weapon_priced_from_modifiers",
        axe == 40,
        format!("woodsman_axe sells for {} (10 + 5 weapon + 5*5 weight)", axe),
    ));

    results.push(check(
        "unknown_resource_defaults_to_one",
        defs.sell_value("mystery_dust") == 1,
        "unknown ids fall back to 1 gold",
    ));

    let curve: Vec<u64> = (1..=4).map(|n| roster_slot_cost(n, 100.0, 1.5)).collect();
    results.push(check(
        "roster_curve_reference_values",
        curve == vec![100, 150, 225, 338],
        format!("costs {:?}", curve),
    ));

    results
}

// ── 4. Live progression loop ────────────────────────────────────────────

fn validate_live_progression(_verbose: bool) -> Vec<TestResult> {
    println!("--- Live Progression ---");
    let mut results = Vec::new();

    // Scenario: 2000ms action, zero agility, eight 250ms ticks.
    let mut engine = Engine::new(training_defs(), EngineConfig::default());
    let hero = engine.add_character("Rowan").expect("roster has room");
    engine
        .select_recipe(hero, "drill", Some("basic_form"))
        .expect("recipe exists");
    engine
        .select_action(hero, Some("drill"))
        .expect("action arms");

    engine.tick(0.0);
    let mut completions = 0;
    for tick in 1..=8 {
        completions += engine.tick(tick as f64 * 250.0).len();
    }
    let snapshot = engine.snapshot();
    results.push(check(
        "eight_quarter_ticks_one_completion",
        completions == 1 && snapshot.characters[0].progress >= 1.0,
        format!("{} completion(s) in 2000ms", completions),
    ));

    // Intellect grants 1% experience per point on eligible actions.
    let mut engine = Engine::new(shipped_defs(), EngineConfig::default());
    let hero = engine.add_character("Wren").expect("roster has room");
    engine.allocate_stat(hero, Stat::Intellect, 10).expect("known character");
    engine.grant_item("raw_fish", 100);
    engine
        .select_recipe(hero, "cooking", Some("fish_stew"))
        .expect("recipe exists");
    engine
        .select_action(hero, Some("cooking"))
        .expect("action arms");
    engine.tick(0.0);
    for tick in 1..=8 {
        engine.tick(tick as f64 * 250.0);
    }
    let snapshot = engine.snapshot();
    let cooking = &snapshot.characters[0].skills["cooking"];
    let skill_xp_ok = (cooking.xp - 1.1).abs() < 1e-9;
    let recipe_xp_ok = (cooking.recipes["fish_stew"].xp - 2.2).abs() < 1e-9;
    results.push(check(
        "intellect_xp_bonus",
        skill_xp_ok && recipe_xp_ok,
        format!(
            "skill xp {:.2}, recipe xp {:.2} with 10 intellect",
            cooking.xp, cooking.recipes["fish_stew"].xp
        ),
    ));

    // Arming is gated on affordable costs.
    let mut engine = Engine::new(shipped_defs(), EngineConfig::default());
    let hero = engine.add_character("Ash").expect("roster has room");
    engine
        .select_recipe(hero, "cooking", Some("fish_stew"))
        .expect("recipe exists");
    let blocked = engine.select_action(hero, Some("cooking"));
    results.push(check(
        "arming_gate_blocks_unaffordable",
        blocked == Err(CommandError::InsufficientResources("cooking".to_string())),
        format!("{:?}", blocked),
    ));

    // Equipment is referenced, never consumed.
    let mut engine = Engine::new(shipped_defs(), EngineConfig::default());
    let hero = engine.add_character("Tam").expect("roster has room");
    engine.grant_item("swift_boots", 1);
    engine.equip_item(hero, "swift_boots").expect("owned item equips");
    let still_owned = engine.inventory().count("swift_boots") == 1;
    results.push(check(
        "equip_is_non_consumptive",
        still_owned,
        "count unchanged after equipping",
    ));
    let _ = engine.unequip_slot(hero, EquipSlot::Legs);

    results
}

// ── 5. Offline catch-up replay ──────────────────────────────────────────

fn validate_offline_catchup(_verbose: bool) -> Vec<TestResult> {
    println!("--- Offline Catch-up ---");
    let mut results = Vec::new();

    // Ten minutes away from a 2000ms action at 500ms coarse steps.
    let mut engine = Engine::new(training_defs(), EngineConfig::default());
    let hero = engine.add_character("Rowan").expect("roster has room");
    engine
        .select_recipe(hero, "drill", Some("basic_form"))
        .expect("recipe exists");
    engine
        .select_action(hero, Some("drill"))
        .expect("action arms");
    engine.tick(0.0);
    engine.tick(600_000.0);

    let summary = engine.take_offline_summary();
    match summary {
        Some(summary) => {
            results.push(check(
                "replay_loop_count",
                summary.loop_count == 1_200,
                format!("{} coarse slices", summary.loop_count),
            ));
            let completions_ok = (summary.completions as i64 - 300).abs() <= 1;
            let skipped_ok = (summary.loops_skipped as i64 - 900).abs() <= 3;
            results.push(check(
                "replay_converges_on_true_rate",
                completions_ok && skipped_ok,
                format!(
                    "{} completions, {} skipped, {} executed",
                    summary.completions, summary.loops_skipped, summary.loops_executed
                ),
            ));
            results.push(check(
                "replay_rewards_match_completions",
                engine.inventory().count("token") == summary.completions,
                format!("{} tokens banked", engine.inventory().count("token")),
            ));
        }
        None => {
            results.push(check("replay_summary_present", false, "no summary after gap"));
        }
    }

    results.push(check(
        "summary_is_one_shot",
        engine.take_offline_summary().is_none(),
        "second take returns nothing",
    ));

    // The forced debug command behaves like a real gap.
    let mut engine = Engine::new(training_defs(), EngineConfig::default());
    let hero = engine.add_character("Wren").expect("roster has room");
    engine
        .select_recipe(hero, "drill", Some("basic_form"))
        .expect("recipe exists");
    engine
        .select_action(hero, Some("drill"))
        .expect("action arms");
    engine.tick(0.0);
    engine.simulate_offline(3_600_000.0);
    let summary = engine.take_offline_summary();
    let hour_completions = summary.map(|s| s.completions).unwrap_or(0);
    results.push(check(
        "hour_long_simulated_absence",
        (hour_completions as i64 - 1_800).abs() <= 2,
        format!("{} completions in a simulated hour", hour_completions),
    ));

    // An idle roster replays to nothing.
    let mut engine = Engine::new(training_defs(), EngineConfig::default());
    engine.add_character("Idle").expect("roster has room");
    engine.tick(0.0);
    engine.tick(600_000.0);
    let summary = engine.take_offline_summary();
    results.push(check(
        "idle_character_gains_nothing",
        summary.map(|s| s.completions) == Some(0),
        "no completions without an armed action",
    ));

    results
}

// ── 6. Persistence round-trip ───────────────────────────────────────────

fn validate_persistence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let mut engine = Engine::new(shipped_defs(), EngineConfig::default());
    let hero = engine.add_character("Rowan").expect("roster has room");
    engine.grant_item("raw_fish", 50);
    engine
        .select_recipe(hero, "cooking", Some("fish_stew"))
        .expect("recipe exists");
    engine
        .select_action(hero, Some("cooking"))
        .expect("action arms");
    engine.tick(0.0);
    for tick in 1..=40 {
        engine.tick(tick as f64 * 250.0);
    }

    let mut buffer = Vec::new();
    let saved = engine.save(&mut buffer).is_ok();
    results.push(check(
        "save_writes_bytes",
        saved && !buffer.is_empty(),
        format!("{} bytes", buffer.len()),
    ));

    match Engine::load(shipped_defs(), EngineConfig::default(), &buffer[..]) {
        Ok(loaded) => {
            let before = engine.snapshot();
            let after = loaded.snapshot();
            let same_inventory = before.inventory == after.inventory;
            let same_skill = before.characters[0].skills["cooking"].xp
                == after.characters[0].skills["cooking"].xp;
            results.push(check(
                "roundtrip_preserves_state",
                same_inventory && same_skill,
                "inventory and skill xp survive",
            ));

            let json = serde_json::to_string(&after).unwrap_or_default();
            let parses = serde_json::from_str::<serde_json::Value>(&json).is_ok();
            results.push(check(
                "snapshot_bridges_as_json",
                parses && json.contains("Rowan"),
                format!("{} bytes of JSON", json.len()),
            ));
        }
        Err(e) => {
            results.push(check("roundtrip_preserves_state", false, format!("{}", e)));
        }
    }

    results
}

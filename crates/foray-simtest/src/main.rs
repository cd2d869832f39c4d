//! Foray Headless Simulation Harness
//!
//! Validates gathering logic and full expedition scenarios without a game
//! shell. Runs entirely in-process — no rendering, no networking.
//!
//! Usage:
//!   cargo run -p foray-simtest
//!   cargo run -p foray-simtest -- --verbose

use foray_core::camp::{BaseCamp, CampDirectory, CampTaskBoard, MemberStats, ObjectiveKind};
use foray_core::collab::{ItemCategory, ItemDirectory, LocationDirectory};
use foray_core::engine::{GatherPhase, GatheringEngine};
use foray_core::events::GatheringEvent;
use foray_logic::config::CarrierThresholds;
use foray_logic::distribution::{self, MemberCapacity};
use foray_logic::movement;
use foray_logic::throughput::{self, YieldAccumulator};

// ── Camp manifest (the same JSON a game shell would ship) ───────────────
const MANIFEST_JSON: &str = include_str!("../../../data/camp_manifest.json");

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
    println!("=== Foray Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Camp manifest validation
    results.extend(validate_manifest());

    // 2. Movement progress sweep
    results.extend(validate_movement());

    // 3. Throughput & fractional accumulation
    results.extend(validate_throughput());

    // 4. Distribution conservation sweep
    results.extend(validate_distribution());

    // 5. Full expedition cycle on manifest data
    results.extend(validate_expedition_cycle());

    // 6. Objective race between two teams
    results.extend(validate_objective_race());

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

// ── 1. Camp manifest ────────────────────────────────────────────────────

fn validate_manifest() -> Vec<TestResult> {
    let mut results = Vec::new();

    // Structural sanity before the typed load.
    let value: serde_json::Value = match serde_json::from_str(MANIFEST_JSON) {
        Ok(v) => v,
        Err(e) => {
            results.push(check("manifest parse", false, format!("{e}")));
            return results;
        }
    };
    let location_count = value["locations"].as_object().map(|m| m.len()).unwrap_or(0);
    let item_count = value["items"].as_object().map(|m| m.len()).unwrap_or(0);
    results.push(check(
        "manifest shape",
        location_count >= 3 && item_count >= 4,
        format!("{location_count} locations, {item_count} items"),
    ));

    let dir = match CampDirectory::from_json(MANIFEST_JSON) {
        Ok(dir) => dir,
        Err(e) => {
            results.push(check("manifest load", false, format!("{e}")));
            return results;
        }
    };

    let mut walkable_with_items = 0;
    let mut bad_coefficients = 0;
    let mut uncategorized = 0;
    for id in dir.location_ids().map(str::to_string).collect::<Vec<_>>() {
        let record = dir.location(&id).expect("listed id resolves");
        if record.walkable && record.has_gatherable_items() {
            walkable_with_items += 1;
        }
        for item in &record.gatherable_items {
            if item.coefficient <= 0.0 {
                bad_coefficients += 1;
            }
            if dir.category(&item.item_id) == ItemCategory::Unknown {
                uncategorized += 1;
            }
        }
    }
    results.push(check(
        "gatherable sites",
        walkable_with_items >= 3,
        format!("{walkable_with_items} walkable sites with items"),
    ));
    results.push(check(
        "yield coefficients",
        bad_coefficients == 0,
        format!("{bad_coefficients} non-positive coefficients"),
    ));
    results.push(check(
        "item categories",
        uncategorized == 0,
        format!("{uncategorized} gatherable items without a category"),
    ));

    results
}

// ── 2. Movement ─────────────────────────────────────────────────────────

fn validate_movement() -> Vec<TestResult> {
    let mut results = Vec::new();

    // Progress is monotonic and arrives in ceil(distance / step) ticks.
    let mut worst: Option<String> = None;
    for &(speed, distance) in &[(25.0f32, 100.0f32), (25.0, 25.0), (30.0, 45.0), (40.0, 100.0)] {
        let step = speed * 1.0;
        let expected_ticks = (distance / step).ceil() as u32;
        let mut progress = 0.0;
        let mut ticks = 0;
        while progress < 1.0 && ticks < 1000 {
            let next = movement::advance_progress(progress, speed, 1.0, distance);
            if next < progress {
                worst = Some(format!("regressed at speed {speed} distance {distance}"));
            }
            progress = next;
            ticks += 1;
        }
        if ticks != expected_ticks {
            worst = Some(format!(
                "speed {speed} distance {distance}: {ticks} ticks, expected {expected_ticks}"
            ));
        }
    }
    results.push(check(
        "travel ticks",
        worst.is_none(),
        worst.unwrap_or_else(|| "arrival matches ceil(distance/step) on all legs".into()),
    ));

    results.push(check(
        "slowest member pace",
        (movement::team_speed(&[30.0, 12.0, 28.0]) - 12.0).abs() < f32::EPSILON
            && movement::team_speed(&[]) == 0.0,
        "minimum of member speeds; empty team stands still",
    ));

    results
}

// ── 3. Throughput ───────────────────────────────────────────────────────

fn validate_throughput() -> Vec<TestResult> {
    let mut results = Vec::new();

    let rate = throughput::tick_yield(40.0, 1.0, 1.0, 40.0);
    results.push(check(
        "unit rate",
        (rate - 1.0).abs() < f32::EPSILON,
        format!("power 40 / normalization 40 → {rate} units/sec"),
    ));

    // A 0.3/tick trickle over 10 ticks must yield exactly 3 units.
    let mut acc = YieldAccumulator::new();
    let mut units = 0;
    for _ in 0..10 {
        units += acc.accrue("wood", 0.3);
    }
    results.push(check(
        "fractional carry",
        units == 3,
        format!("10 × 0.3 ticks → {units} whole units (expected 3)"),
    ));

    results.push(check(
        "idle members",
        throughput::team_gathering_power(&[20.0, 0.0, -5.0]) == 20.0,
        "non-positive stats contribute nothing",
    ));

    results
}

// ── 4. Distribution ─────────────────────────────────────────────────────

fn validate_distribution() -> Vec<TestResult> {
    let mut results = Vec::new();
    let thresholds = CarrierThresholds::default();

    // Conservation across a deterministic sweep of team shapes.
    let mut violations = 0;
    let mut cases = 0;
    for team_size in 1..5usize {
        for quantity in 0..40u32 {
            let members: Vec<MemberCapacity> = (0..team_size)
                .map(|i| MemberCapacity {
                    free: (i as u32 * 7 + quantity) % 13,
                    carrier: i % 2 == 1,
                })
                .collect();
            let capacity = distribution::total_free_capacity(&members);
            let plan = distribution::plan_distribution(&members, quantity);
            cases += 1;
            if plan.assigned_total() != quantity.min(capacity)
                || plan.assigned_total() + plan.overflow != quantity
            {
                violations += 1;
            }
        }
    }
    results.push(check(
        "conservation",
        violations == 0,
        format!("{cases} cases, {violations} violations"),
    ));

    results.push(check(
        "carrier classification",
        distribution::is_carrier(5.0, 60.0, &thresholds)
            && !distribution::is_carrier(15.0, 60.0, &thresholds)
            && !distribution::is_carrier(5.0, 40.0, &thresholds),
        "low gatherer + strong hauler only",
    ));

    results
}

// ── 5. Expedition cycle ─────────────────────────────────────────────────

fn validate_expedition_cycle() -> Vec<TestResult> {
    let mut results = Vec::new();

    let dir = CampDirectory::from_json(MANIFEST_JSON).expect("manifest loads");
    let mut engine = GatheringEngine::new();
    let mut camp = BaseCamp::new();
    let mut tasks = CampTaskBoard::default();
    tasks.add("wood", ObjectiveKind::Specified, 25);

    let team = camp.create_team();
    let mut rng = rand::thread_rng();
    for _ in 0..4 {
        camp.add_random_member(team, &mut rng);
    }

    let started;
    let mut unloads = 0;
    let mut gathered = 0;
    {
        let mut collab = camp.collaborators(&dir, &mut tasks);
        started = engine.start_gathering_for_item(&mut collab, team, "plains", "wood");
        for _ in 0..2000 {
            engine.update(&mut collab);
            for event in engine.drain_events() {
                match event {
                    GatheringEvent::UnloadCompleted { .. } => unloads += 1,
                    GatheringEvent::ItemGathered { report, .. } => gathered += report.quantity,
                    _ => {}
                }
            }
            if engine.state(team) == GatherPhase::Inactive {
                break;
            }
        }
    }

    results.push(check("expedition starts", started, "team heads for the plains"));
    results.push(check(
        "expedition completes",
        engine.state(team) == GatherPhase::Inactive,
        format!("{unloads} unload(s), {gathered} wood gathered"),
    ));
    results.push(check(
        "objective settled",
        tasks.remaining("wood") == 0,
        format!("{} wood banked at base", camp.base_count("wood")),
    ));
    results.push(check(
        "deliveries cover objective",
        camp.base_count("wood") >= 25,
        format!("base holds {}", camp.base_count("wood")),
    ));

    results
}

// ── 6. Objective race ───────────────────────────────────────────────────

fn validate_objective_race() -> Vec<TestResult> {
    let mut results = Vec::new();

    let dir = CampDirectory::from_json(MANIFEST_JSON).expect("manifest loads");
    let mut engine = GatheringEngine::new();
    let mut camp = BaseCamp::new();
    let mut tasks = CampTaskBoard::default();
    tasks.add("herbs", ObjectiveKind::Specified, 20);

    let strong = MemberStats {
        gathering: 40.0,
        carry_capacity: 12.0,
        speed: 30.0,
    };
    let team_a = camp.create_team();
    camp.add_member(team_a, strong);
    let team_b = camp.create_team();
    camp.add_member(team_b, strong);

    {
        let mut collab = camp.collaborators(&dir, &mut tasks);
        engine.start_gathering_for_item(&mut collab, team_a, "swamp", "herbs");
        engine.start_gathering_for_item(&mut collab, team_b, "swamp", "herbs");
        for _ in 0..500 {
            engine.update(&mut collab);
            if engine.state(team_a) == GatherPhase::Inactive
                && engine.state(team_b) == GatherPhase::Inactive
            {
                break;
            }
        }
    }

    results.push(check(
        "both teams stand down",
        engine.state(team_a) == GatherPhase::Inactive
            && engine.state(team_b) == GatherPhase::Inactive,
        "no team keeps working a finished objective",
    ));
    results.push(check(
        "remaining is exactly zero",
        tasks.remaining("herbs") == 0,
        format!("{} herbs banked", camp.base_count("herbs")),
    ));

    results
}

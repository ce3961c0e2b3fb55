//! Orbsim Headless Validation Harness
//!
//! Drives full scenarios through the pure simulation core and runs the
//! integrity battery against every produced trajectory. No UI, no
//! rendering, no persistence — everything happens in-process.
//!
//! Usage:
//!   cargo run -p orbsim-simtest
//!   cargo run -p orbsim-simtest -- --verbose
//!   cargo run -p orbsim-simtest -- --json > trajectory.json

use orbsim_logic::costs::{fleet_cost, FleetCostInputs};
use orbsim_logic::deployment::GrowthStrategy;
use orbsim_logic::economy::econ_constants;
use orbsim_logic::invariants::{run_integrity_tests, standard_battery};
use orbsim_logic::runlog::RunLog;
use orbsim_logic::scenario::{
    randomize_scenario, run_scenario, validate_scenario, ScenarioConfig,
};
use orbsim_logic::thermal::RiskMode;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");

    if json {
        dump_json_snapshot();
        return;
    }

    println!("=== Orbsim Validation Harness ===\n");

    let mut results = Vec::new();

    // 1. Scenario configuration validation
    results.extend(validate_scenarios(verbose));

    // 2. Deployment growth across strategies
    results.extend(validate_deployment(verbose));

    // 3. Physics behavior per risk mode
    results.extend(validate_physics(verbose));

    // 4. Economic trajectory
    results.extend(validate_economy(verbose));

    // 5. Fleet cost reference scenario
    results.extend(validate_fleet_cost(verbose));

    // 6. Integrity battery over every strategy × mode pair
    results.extend(validate_battery(verbose));

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

// ── JSON snapshot ───────────────────────────────────────────────────────

/// One year of the derived export. Non-canonical — a flattened view of
/// the in-memory trajectory for external tooling.
#[derive(serde::Serialize)]
struct YearSummary {
    year: u32,
    satellites: u32,
    fleet_power_mw: f64,
    exportable_pflops: f64,
    end_of_year_temp_c: f64,
    end_of_year_survival: f64,
    ground_price_per_pflop_year: f64,
    orbital_price_per_pflop_year: f64,
    orbital_share: f64,
    ground_tco2_per_pflop_year: f64,
    orbital_tco2_per_pflop_year: f64,
}

fn dump_json_snapshot() {
    let mut log = RunLog::new();
    let run = run_scenario(&ScenarioConfig::default(), &mut log)
        .expect("baseline scenario must run");

    let ticks_per_year = run.config.ticks_per_year as usize;
    let summaries: Vec<YearSummary> = run
        .deployment
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let last_tick = &run.snapshots[(i + 1) * ticks_per_year - 1];
            let econ = &run.economy[i];
            let carbon = &run.carbon[i];
            YearSummary {
                year: d.year,
                satellites: d.total_satellites(),
                fleet_power_mw: d.total_power_mw,
                exportable_pflops: run.exportable_pflops_by_year[i],
                end_of_year_temp_c: last_tick.temp_core_c,
                end_of_year_survival: last_tick.survival_fraction,
                ground_price_per_pflop_year: econ.price.price_per_pflop_year,
                orbital_price_per_pflop_year: econ.orbital_price,
                orbital_share: econ.demand.orbital_share,
                ground_tco2_per_pflop_year: carbon.ground_tco2_per_pflop_year,
                orbital_tco2_per_pflop_year: carbon.orbital_tco2_per_pflop_year,
            }
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&summaries).expect("snapshot serializes")
    );
}

// ── 1. Scenario validation ──────────────────────────────────────────────

fn validate_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Scenario Validation ---");
    let mut results = Vec::new();

    let errors = validate_scenario(&ScenarioConfig::default());
    results.push(TestResult {
        name: "default_scenario_valid".into(),
        passed: errors.is_empty(),
        detail: format!("{} errors", errors.len()),
    });

    let mut invalid = 0;
    for seed in 0..25u64 {
        let config = randomize_scenario(seed);
        if !validate_scenario(&config).is_empty() {
            invalid += 1;
        }
        if verbose {
            println!("  seed {seed}: {} / {:?} / {:?}", config.name, config.strategy, config.mode);
        }
    }
    results.push(TestResult {
        name: "randomized_sweep_valid".into(),
        passed: invalid == 0,
        detail: format!("{invalid}/25 invalid"),
    });

    results
}

// ── 2. Deployment growth ────────────────────────────────────────────────

fn validate_deployment(verbose: bool) -> Vec<TestResult> {
    println!("--- Deployment Growth ---");
    let mut results = Vec::new();

    for &strategy in GrowthStrategy::all() {
        let config = ScenarioConfig {
            name: format!("deploy-{}", strategy.profile().name),
            strategy,
            ..ScenarioConfig::default()
        };
        let mut log = RunLog::new();
        match run_scenario(&config, &mut log) {
            Ok(run) => {
                let monotone = run
                    .deployment
                    .windows(2)
                    .all(|p| p[1].total_satellites() >= p[0].total_satellites());
                let last = run.deployment.last().unwrap();
                if verbose {
                    println!(
                        "  {}: {} sats, {:.0} MW after {} years",
                        strategy.profile().name,
                        last.total_satellites(),
                        last.total_power_mw,
                        config.years
                    );
                }
                results.push(TestResult {
                    name: format!("growth_monotone_{}", strategy.profile().name),
                    passed: monotone,
                    detail: format!("{} satellites final", last.total_satellites()),
                });
            }
            Err(e) => results.push(TestResult {
                name: format!("growth_monotone_{}", strategy.profile().name),
                passed: false,
                detail: format!("run failed: {e}"),
            }),
        }
    }

    results
}

// ── 3. Physics behavior ─────────────────────────────────────────────────

fn validate_physics(verbose: bool) -> Vec<TestResult> {
    println!("--- Thermal & Survival Physics ---");
    let mut results = Vec::new();

    // Safe mode: box respected, never throttled.
    let mut log = RunLog::new();
    let safe = run_scenario(&ScenarioConfig::default(), &mut log).expect("safe run");
    let in_box = safe
        .snapshots
        .iter()
        .all(|s| (40.0..=90.0).contains(&s.temp_core_c) && s.survival_fraction >= 0.90);
    results.push(TestResult {
        name: "safe_mode_box".into(),
        passed: in_box && log.count_throttles() == 0,
        detail: format!(
            "{} ticks, {} throttles",
            safe.snapshots.len(),
            log.count_throttles()
        ),
    });

    // Undersized yolo fleet: throttles, burns out, degrades.
    let mut log = RunLog::new();
    let yolo_config = ScenarioConfig {
        name: "yolo-undersized".into(),
        mode: RiskMode::Yolo,
        radiator_m2_per_sat: 20.0,
        ..ScenarioConfig::default()
    };
    let yolo = run_scenario(&yolo_config, &mut log).expect("yolo run");
    let final_survival = yolo.snapshots.last().unwrap().survival_fraction;
    if verbose {
        println!(
            "  yolo: {} throttles, {} burnouts, final survival {:.3}",
            log.count_throttles(),
            log.count_burnouts(),
            final_survival
        );
    }
    results.push(TestResult {
        name: "yolo_throttles_and_degrades".into(),
        passed: log.count_throttles() > 0 && log.count_burnouts() > 0 && final_survival < 0.90,
        detail: format!("final survival {final_survival:.3}"),
    });

    // Effective compute never exceeds raw, any mode.
    for &mode in RiskMode::all() {
        let config = ScenarioConfig {
            name: format!("bound-{mode:?}"),
            mode,
            radiator_m2_per_sat: 50.0,
            ..ScenarioConfig::default()
        };
        let mut log = RunLog::new();
        let run = run_scenario(&config, &mut log).expect("bound run");
        let bounded = run
            .snapshots
            .iter()
            .all(|s| s.compute_effective_flops <= s.compute_raw_flops + 1e-6);
        results.push(TestResult {
            name: format!("effective_le_raw_{mode:?}"),
            passed: bounded,
            detail: format!("{} ticks checked", run.snapshots.len()),
        });
    }

    results
}

// ── 4. Economic trajectory ──────────────────────────────────────────────

fn validate_economy(verbose: bool) -> Vec<TestResult> {
    println!("--- Economic Trajectory ---");
    let mut results = Vec::new();

    let config = ScenarioConfig {
        name: "econ-20y".into(),
        years: 20,
        ..ScenarioConfig::default()
    };
    let mut log = RunLog::new();
    let run = run_scenario(&config, &mut log).expect("economy run");

    let cap = 1.0 + econ_constants::SCARCITY_K;
    let rent_bounded = run
        .economy
        .iter()
        .all(|y| y.supply.scarcity_multiplier >= 1.0 && y.supply.scarcity_multiplier <= cap + 1e-12);
    results.push(TestResult {
        name: "scarcity_rent_bounded".into(),
        passed: rent_bounded,
        detail: format!("cap {cap:.2}"),
    });

    let share_ramps = {
        let first = run.economy.first().unwrap().demand.orbital_share;
        let last = run.economy.last().unwrap().demand.orbital_share;
        last > first
    };
    results.push(TestResult {
        name: "orbital_share_ramps".into(),
        passed: share_ramps,
        detail: format!(
            "share {:.2} -> {:.2}",
            run.economy.first().unwrap().demand.orbital_share,
            run.economy.last().unwrap().demand.orbital_share
        ),
    });

    if verbose {
        for y in run.economy.iter().step_by(5) {
            println!(
                "  year {:2}: ground ${:>9.0}, orbital ${:>9.0}, share {:.2}",
                y.year,
                y.price.price_per_pflop_year,
                y.orbital_price,
                y.demand.orbital_share
            );
        }
    }

    let crossover = run
        .carbon
        .iter()
        .find(|y| y.crossover)
        .map(|y| y.year);
    results.push(TestResult {
        name: "carbon_crossover_in_range".into(),
        passed: crossover.is_some(),
        detail: format!("crossover year {crossover:?}"),
    });

    results
}

// ── 5. Fleet cost scenario ──────────────────────────────────────────────

fn validate_fleet_cost(verbose: bool) -> Vec<TestResult> {
    println!("--- Fleet Cost Scenario ---");
    let mut results = Vec::new();

    let summary = fleet_cost(&FleetCostInputs::default());
    if verbose {
        println!(
            "  {} sats, ${:.1}B total, ${:.1}/W, LCOE ${:.2}/kWh",
            summary.satellite_count,
            summary.total_cost_usd / 1e9,
            summary.cost_per_w_usd,
            summary.lcoe_usd_per_kwh
        );
    }
    results.push(TestResult {
        name: "fleet_cost_reference".into(),
        passed: summary.satellite_count == 37_038
            && summary.total_cost_usd > 0.0
            && summary.lcoe_usd_per_kwh.is_finite(),
        detail: format!("${:.2}/W", summary.cost_per_w_usd),
    });

    let again = fleet_cost(&FleetCostInputs::default());
    results.push(TestResult {
        name: "fleet_cost_deterministic".into(),
        passed: summary.total_cost_usd.to_bits() == again.total_cost_usd.to_bits(),
        detail: "bit-for-bit".into(),
    });

    results
}

// ── 6. Integrity battery ────────────────────────────────────────────────

fn validate_battery(verbose: bool) -> Vec<TestResult> {
    println!("--- Integrity Battery ---");
    let mut results = Vec::new();
    let battery = standard_battery();

    for &strategy in GrowthStrategy::all() {
        for &mode in RiskMode::all() {
            let config = ScenarioConfig {
                name: format!("battery-{}-{mode:?}", strategy.profile().name),
                strategy,
                mode,
                ..ScenarioConfig::default()
            };
            let mut log = RunLog::new();
            let name = format!("battery_{}_{mode:?}", strategy.profile().name);
            match run_scenario(&config, &mut log) {
                Ok(run) => {
                    let report = run_integrity_tests(&battery, &run);
                    if verbose {
                        println!(
                            "  {}/{:?}: {}/{} checks passed",
                            strategy.profile().name,
                            mode,
                            report.results.iter().filter(|r| r.passed).count(),
                            report.results.len()
                        );
                    }
                    results.push(TestResult {
                        name,
                        passed: report.all_passed,
                        detail: if report.all_passed {
                            format!("{} checks", report.results.len())
                        } else {
                            report.failures.join("; ")
                        },
                    });
                }
                Err(e) => results.push(TestResult {
                    name,
                    passed: false,
                    detail: format!("run failed: {e}"),
                }),
            }
        }
    }

    results
}

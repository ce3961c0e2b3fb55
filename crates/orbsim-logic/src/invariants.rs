//! Trajectory integrity checks — conservation, monotonicity, bounds.
//!
//! The battery runs against a completed [`SimulationRun`] and reports
//! violations; it never corrects them. Repair or alerting belongs to
//! whoever registered the failure callback.

use serde::{Deserialize, Serialize};

use crate::carbon::MAX_TRANSITION_RATE;
use crate::costs;
use crate::deployment::{self, OrbitalShell};
use crate::economy::{self, econ_constants};
use crate::scenario::SimulationRun;
use crate::thermal::RiskMode;

/// Outcome of one integrity test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityTestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Aggregated battery outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub all_passed: bool,
    pub results: Vec<IntegrityTestResult>,
    pub failures: Vec<String>,
}

/// A named check over a completed run.
pub struct IntegrityTest {
    pub name: &'static str,
    pub check: fn(&SimulationRun) -> Result<(), String>,
}

/// Run a battery of checks. The run is read-only throughout.
pub fn run_integrity_tests(tests: &[IntegrityTest], run: &SimulationRun) -> IntegrityReport {
    run_integrity_tests_with(tests, run, |_| {})
}

/// Like [`run_integrity_tests`], with a callback invoked on each
/// failure. This is the extension point for external repair/alerting;
/// nothing in this crate mutates a trajectory in response.
pub fn run_integrity_tests_with(
    tests: &[IntegrityTest],
    run: &SimulationRun,
    mut on_failure: impl FnMut(&IntegrityTestResult),
) -> IntegrityReport {
    let mut results = Vec::with_capacity(tests.len());
    let mut failures = Vec::new();

    for test in tests {
        let outcome = (test.check)(run);
        let result = match outcome {
            Ok(()) => IntegrityTestResult {
                name: test.name.to_string(),
                passed: true,
                detail: "ok".to_string(),
            },
            Err(detail) => IntegrityTestResult {
                name: test.name.to_string(),
                passed: false,
                detail,
            },
        };
        if !result.passed {
            log::warn!("integrity test {} failed: {}", result.name, result.detail);
            failures.push(format!("{}: {}", result.name, result.detail));
            on_failure(&result);
        }
        results.push(result);
    }

    IntegrityReport {
        all_passed: failures.is_empty(),
        results,
        failures,
    }
}

/// The full standard battery.
pub fn standard_battery() -> Vec<IntegrityTest> {
    vec![
        IntegrityTest {
            name: "effective_compute_bounded_by_raw",
            check: check_effective_le_raw,
        },
        IntegrityTest {
            name: "safe_mode_survival_and_temperature_box",
            check: check_safe_bounds,
        },
        IntegrityTest {
            name: "cost_components_sum_to_total",
            check: check_cost_summation,
        },
        IntegrityTest {
            name: "thermal_cap_flag_consistency",
            check: check_thermal_cap_consistency,
        },
        IntegrityTest {
            name: "scarcity_rent_monotone_and_saturating",
            check: check_scarcity_rent,
        },
        IntegrityTest {
            name: "fleet_count_non_decreasing",
            check: check_deployment_monotone,
        },
        IntegrityTest {
            name: "per_shell_power_floors",
            check: check_power_floors,
        },
        IntegrityTest {
            name: "carbon_transition_rate_bounded",
            check: check_carbon_transition,
        },
        IntegrityTest {
            name: "carbon_crossover_latched",
            check: check_carbon_crossover,
        },
        IntegrityTest {
            name: "orbital_share_shift_bounded",
            check: check_share_shift,
        },
        IntegrityTest {
            name: "fleet_cost_scenario_deterministic",
            check: check_fleet_cost_determinism,
        },
        IntegrityTest {
            name: "deployment_roundtrip_reproduces",
            check: check_deployment_roundtrip,
        },
    ]
}

fn check_effective_le_raw(run: &SimulationRun) -> Result<(), String> {
    for snap in &run.snapshots {
        if snap.compute_effective_flops > snap.compute_raw_flops + 1e-6 {
            return Err(format!(
                "year {} tick {}: effective {:.3e} > raw {:.3e}",
                snap.year, snap.tick, snap.compute_effective_flops, snap.compute_raw_flops
            ));
        }
    }
    Ok(())
}

fn check_safe_bounds(run: &SimulationRun) -> Result<(), String> {
    let policy = RiskMode::Safe.policy();
    for snap in run.snapshots.iter().filter(|s| s.mode == RiskMode::Safe) {
        if snap.survival_fraction < policy.survival_floor || snap.survival_fraction > 1.0 {
            return Err(format!(
                "year {} tick {}: survival {:.4} outside [{}, 1.0]",
                snap.year, snap.tick, snap.survival_fraction, policy.survival_floor
            ));
        }
        if snap.temp_core_c < policy.temp_floor_c - 1e-9
            || snap.temp_core_c > policy.temp_ceiling_c + 1e-9
        {
            return Err(format!(
                "year {} tick {}: temperature {:.2} C outside box",
                snap.year, snap.tick, snap.temp_core_c
            ));
        }
    }
    Ok(())
}

fn check_cost_summation(run: &SimulationRun) -> Result<(), String> {
    for c in &run.orbital_costs {
        let sum = c.launch + c.hardware + c.operations + c.replacement;
        if (c.total - sum).abs() > 0.001 * c.total.abs().max(1e-9) {
            return Err(format!(
                "year {}: orbital components sum {:.2} != total {:.2}",
                c.year, sum, c.total
            ));
        }
    }
    for c in &run.ground_costs {
        let sum = c.capex + c.energy + c.cooling + c.network;
        if (c.total - sum).abs() > 0.001 * c.total.abs().max(1e-9) {
            return Err(format!(
                "year {}: ground components sum {:.2} != total {:.2}",
                c.year, sum, c.total
            ));
        }
    }
    Ok(())
}

fn check_thermal_cap_consistency(run: &SimulationRun) -> Result<(), String> {
    for (i, tick) in run.ticks.iter().enumerate() {
        let should_cap = tick.max_rejectable_kw < tick.waste_heat_kw;
        if tick.thermal_capped != should_cap {
            return Err(format!(
                "tick {i}: capped flag {} but rejectable {:.1} vs waste {:.1}",
                tick.thermal_capped, tick.max_rejectable_kw, tick.waste_heat_kw
            ));
        }
        if tick.thermal_capped {
            if tick.thermal_cap_factor <= 0.0 || tick.thermal_cap_factor >= 1.0 {
                return Err(format!(
                    "tick {i}: capped but factor {} outside (0, 1)",
                    tick.thermal_cap_factor
                ));
            }
        } else if (tick.thermal_cap_factor - 1.0).abs() > 1e-9 {
            return Err(format!(
                "tick {i}: uncapped but factor {} != 1",
                tick.thermal_cap_factor
            ));
        }
    }
    Ok(())
}

fn check_scarcity_rent(_run: &SimulationRun) -> Result<(), String> {
    let at_zero = economy::scarcity_multiplier(0.0);
    if (at_zero - 1.0).abs() > 1e-12 {
        return Err(format!("rent at zero wait is {at_zero}, expected 1.0"));
    }
    let waits = [0.0, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0];
    for pair in waits.windows(2) {
        let lo = economy::scarcity_multiplier(pair[0]);
        let hi = economy::scarcity_multiplier(pair[1]);
        if hi < lo {
            return Err(format!(
                "rent decreased from {lo} to {hi} between waits {} and {}",
                pair[0], pair[1]
            ));
        }
    }
    let sat_10 = economy::scarcity_multiplier(10.0);
    let sat_20 = economy::scarcity_multiplier(20.0);
    if (sat_10 - sat_20).abs() > 1e-12 {
        return Err(format!("rent not saturated: wait 10 -> {sat_10}, wait 20 -> {sat_20}"));
    }
    Ok(())
}

fn check_deployment_monotone(run: &SimulationRun) -> Result<(), String> {
    let mut prev = run.config.initial_fleet.total_satellites();
    for r in &run.deployment {
        let total = r.total_satellites();
        if total < prev {
            return Err(format!(
                "year {}: fleet shrank from {prev} to {total}",
                r.year
            ));
        }
        prev = total;
    }
    Ok(())
}

fn check_power_floors(run: &SimulationRun) -> Result<(), String> {
    for r in &run.deployment {
        for (shell, power) in [
            (OrbitalShell::Leo, r.power_leo_kw),
            (OrbitalShell::Meo, r.power_meo_kw),
            (OrbitalShell::Geo, r.power_geo_kw),
        ] {
            let info = shell.info();
            if r.year >= info.floor_from_year && power < info.power_floor_kw {
                return Err(format!(
                    "year {}: {} power {:.1} kW below floor {:.1}",
                    r.year, info.name, power, info.power_floor_kw
                ));
            }
        }
    }
    Ok(())
}

fn check_carbon_transition(run: &SimulationRun) -> Result<(), String> {
    for pair in run.carbon.windows(2) {
        let prev = pair[0].orbital_tco2_per_pflop_year;
        let cur = pair[1].orbital_tco2_per_pflop_year;
        if prev > 0.0 {
            let decline = (prev - cur) / prev;
            if decline > MAX_TRANSITION_RATE + 1e-12 {
                return Err(format!(
                    "year {}: orbital carbon fell {:.0}% in one year",
                    pair[1].year,
                    decline * 100.0
                ));
            }
        }
    }
    Ok(())
}

fn check_carbon_crossover(run: &SimulationRun) -> Result<(), String> {
    let mut crossed = false;
    for y in &run.carbon {
        let below = y.orbital_tco2_per_pflop_year < y.ground_tco2_per_pflop_year;
        if crossed && !below {
            return Err(format!(
                "year {}: orbital carbon rose back above ground after crossover",
                y.year
            ));
        }
        if below {
            crossed = true;
        }
        if y.crossover != crossed {
            return Err(format!("year {}: crossover flag out of sync", y.year));
        }
    }
    Ok(())
}

fn check_share_shift(run: &SimulationRun) -> Result<(), String> {
    let mut prev_share = 0.0;
    for y in &run.economy {
        let shift = (y.demand.orbital_share - prev_share).abs();
        if shift > econ_constants::MAX_SHARE_SHIFT + 1e-9 {
            return Err(format!(
                "year {}: orbital share moved {:.3} in one year",
                y.year, shift
            ));
        }
        prev_share = y.demand.orbital_share;
    }
    Ok(())
}

fn check_fleet_cost_determinism(run: &SimulationRun) -> Result<(), String> {
    let a = costs::fleet_cost(&run.config.fleet_inputs);
    let b = costs::fleet_cost(&run.config.fleet_inputs);
    if a.total_cost_usd.to_bits() != b.total_cost_usd.to_bits()
        || a.cost_per_w_usd.to_bits() != b.cost_per_w_usd.to_bits()
        || a.lcoe_usd_per_kwh.to_bits() != b.lcoe_usd_per_kwh.to_bits()
    {
        return Err("fleet cost scenario not bit-for-bit reproducible".to_string());
    }
    Ok(())
}

fn check_deployment_roundtrip(run: &SimulationRun) -> Result<(), String> {
    let mut state = run.config.initial_fleet.clone();
    for recorded in &run.deployment {
        let replayed = deployment::step_year(&state, recorded.strategy)
            .map_err(|e| format!("replay failed in year {}: {e}", recorded.year))?;
        if &replayed != recorded {
            return Err(format!(
                "year {}: replayed deployment diverged from recorded",
                recorded.year
            ));
        }
        state = replayed.to_state();
    }
    Ok(())
}

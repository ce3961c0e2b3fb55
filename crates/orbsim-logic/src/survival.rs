//! Fleet survival — hazard integral, smoothing, and failure bookkeeping.
//!
//! Survival blends three signals: the hazard-integral survival from an
//! annualized failure rate, the previous tick's value (smoothing), and
//! the ratio of alive to alive-plus-failed satellites. A fleet with
//! unrecovered failures is never allowed to report near-perfect
//! survival; a minimum decay is forced instead.

use serde::{Deserialize, Serialize};

use crate::thermal::{PhysicsState, RiskPolicy};

const HAZARD_WEIGHT: f64 = 0.6;
const SMOOTHING_WEIGHT: f64 = 0.2;
const FLEET_RATIO_WEIGHT: f64 = 0.2;

/// Baseline annualized failure rate for an unstressed LEO fleet.
const BASE_ANNUAL_FAILURE_RATE: f64 = 0.04;
/// Additional annual rate per °C of core temperature above the stress point.
const THERMAL_HAZARD_PER_C: f64 = 0.002;
/// Core temperature where thermal stress starts accumulating.
const THERMAL_STRESS_REF_C: f64 = 60.0;
/// Hazard relief at shielding = 100% of satellite mass.
const SHIELDING_RELIEF: f64 = 0.5;
/// Annual hazard relief per pod/tick of on-orbit servicing capacity.
const REPAIR_RELIEF_PER_POD: f64 = 0.002;
/// The hazard rate never drops below this.
const MIN_ANNUAL_HAZARD: f64 = 0.005;

/// Above this blended value the fleet reads as "perfect".
const PERFECT_FLEET_THRESHOLD: f64 = 0.98;
/// Forced per-tick decay for a "perfect" fleet that has unrecovered failures.
const MIN_SURVIVAL_DECAY: f64 = 0.005;
/// Share of newly failed pods that remain repairable.
const DEGRADABLE_SHARE: f64 = 0.6;

/// One tick's survival outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalOutcome {
    pub survival_fraction: f64,
    pub repairs_performed: f64,
    /// Newly failed capacity this tick, expressed in satellites.
    pub attrition_sats: f64,
    pub forced_decay: bool,
}

/// Annualized hazard rate for the current state.
pub fn hazard_rate(state: &PhysicsState) -> f64 {
    let thermal_stress = (state.temp_core_c - THERMAL_STRESS_REF_C).max(0.0);
    let shield_share = if state.total_mass_kg > 0.0 {
        (state.shielding_kg / state.total_mass_kg).min(1.0)
    } else {
        0.0
    };
    let raw = (BASE_ANNUAL_FAILURE_RATE + THERMAL_HAZARD_PER_C * thermal_stress)
        * state.shell.info().radiation_factor
        * (1.0 - SHIELDING_RELIEF * shield_share)
        - REPAIR_RELIEF_PER_POD * state.repair_capacity;
    raw.max(MIN_ANNUAL_HAZARD)
}

/// Advance survival for one tick and apply the hard multiplier rule:
/// fleet power and raw compute always end the tick as the as-deployed
/// capacity scaled by the new survival fraction.
pub fn advance_survival(
    state: &mut PhysicsState,
    fleet_size: u32,
    policy: &RiskPolicy,
) -> SurvivalOutcome {
    let dt_years = 1.0 / state.ticks_per_year.max(1) as f64;
    let prev = state.survival_fraction;

    // The hazard integral accumulates monotonically and never resets.
    state.cumulative_hazard += hazard_rate(state) * dt_years;
    let hazard_survival = (-state.cumulative_hazard).exp();

    let alive = (fleet_size as f64 - state.failures_unrecovered).max(0.0);
    let fleet_ratio = if alive + state.failures_unrecovered > 0.0 {
        alive / (alive + state.failures_unrecovered)
    } else {
        1.0
    };

    let mut blended = HAZARD_WEIGHT * hazard_survival
        + SMOOTHING_WEIGHT * prev
        + FLEET_RATIO_WEIGHT * fleet_ratio;

    let mut forced_decay = false;
    if state.failures_unrecovered > 0.0 && blended >= PERFECT_FLEET_THRESHOLD {
        blended = prev - MIN_SURVIVAL_DECAY;
        forced_decay = true;
        log::debug!("forcing survival decay: failures exist but blend read {blended:.4}");
    }

    let survival = blended.clamp(policy.survival_floor, 1.0);

    let attrition_sats = (prev - survival).max(0.0) * fleet_size as f64;
    state.degraded_pods += attrition_sats * DEGRADABLE_SHARE;
    state.failures_unrecovered += attrition_sats * (1.0 - DEGRADABLE_SHARE);

    let repair_budget = state.maintenance_capacity + state.repair_capacity;
    let repairs_performed = state.degraded_pods.min(repair_budget);
    state.degraded_pods -= repairs_performed;

    state.survival_fraction = survival;
    state.power_total_kw = state.deployed_power_kw * survival;
    state.compute_raw_flops = state.deployed_compute_flops * survival;

    SurvivalOutcome {
        survival_fraction: survival,
        repairs_performed,
        attrition_sats,
        forced_decay,
    }
}

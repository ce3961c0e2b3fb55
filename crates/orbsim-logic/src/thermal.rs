//! Thermal physics stepper — radiator equilibrium, derating, risk policy.
//!
//! Each tick solves the radiator/core temperature directly from the
//! Stefan-Boltzmann balance `T = (q/(ε·σ) + T_sink⁴)^¼` instead of
//! relaxing toward it. If the radiator cannot reject the generated heat
//! at the ceiling, generation itself is throttled before the final pass.
//! Over-temperature is a runtime condition and is always derated or
//! clamped, never raised as an error.
//!
//! The silicon-leakage feedback (hotter cores draw more power) uses the
//! previous tick's temperature, which keeps each tick closed-form; the
//! loop closes across ticks.

use serde::{Deserialize, Serialize};

use crate::constants::physics::{KELVIN_OFFSET, SINK_TEMP_K, STEFAN_BOLTZMANN};
use crate::deployment::OrbitalShell;
use crate::survival;
use crate::throughput;

/// Fraction of electrical draw that becomes waste heat.
pub const HEAT_FRACTION: f64 = 0.85;
/// Battery round-trip efficiency covering the eclipsed orbit fraction.
const BATTERY_ROUND_TRIP: f64 = 0.90;
/// Extra leakage draw per °C of core temperature above the reference.
const LEAKAGE_PER_C: f64 = 0.002;
/// Core temperature at which leakage is 1.0×.
const LEAKAGE_REF_C: f64 = 40.0;
/// Radiator utilization target for forward sizing in safe mode.
pub const SAFE_UTILIZATION_TARGET: f64 = 0.90;
/// Radiator area/emissivity lost per tick spent above the ceiling.
const BURNOUT_DECAY: f64 = 0.01;
/// Emissivity never decays below this.
const EMISSIVITY_FLOOR: f64 = 0.20;

// ============================================================================
// RISK MODES
// ============================================================================

/// Operating risk posture. Selects the clamp policy applied throughout
/// the tick: temperature box, survival floor, burnout and sizing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RiskMode {
    /// Forward-sized radiators, hard 40–90 °C box, survival ≥ 0.90.
    Safe = 0,
    /// Fixed hardware, burnout allowed, survival ≥ 0.10.
    Aggressive = 1,
    /// No survival floor. Fleets are allowed to die.
    Yolo = 2,
}

/// Clamp policy for one risk mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPolicy {
    pub temp_floor_c: f64,
    pub temp_ceiling_c: f64,
    pub survival_floor: f64,
    pub burnout_enabled: bool,
    pub forward_sizing: bool,
}

impl RiskMode {
    pub fn policy(&self) -> RiskPolicy {
        match self {
            Self::Safe => RiskPolicy {
                temp_floor_c: 40.0,
                temp_ceiling_c: 90.0,
                survival_floor: 0.90,
                burnout_enabled: false,
                forward_sizing: true,
            },
            Self::Aggressive => RiskPolicy {
                temp_floor_c: -20.0,
                temp_ceiling_c: 120.0,
                survival_floor: 0.10,
                burnout_enabled: true,
                forward_sizing: false,
            },
            Self::Yolo => RiskPolicy {
                temp_floor_c: -50.0,
                temp_ceiling_c: 150.0,
                survival_floor: 0.0,
                burnout_enabled: true,
                forward_sizing: false,
            },
        }
    }

    pub fn all() -> &'static [RiskMode] {
        &[Self::Safe, Self::Aggressive, Self::Yolo]
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Mutable fleet physics state, advanced tick to tick. One instance per
/// simulated fleet; never shared across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsState {
    /// Current fleet IT power draw (kW), survival- and idle-scaled.
    pub power_total_kw: f64,
    /// Current raw fleet compute (FLOPS), survival-scaled.
    pub compute_raw_flops: f64,
    /// As-deployed fleet power this year (kW), before survival/idle scaling.
    pub deployed_power_kw: f64,
    /// As-deployed fleet compute this year (FLOPS).
    pub deployed_compute_flops: f64,
    /// Total fleet radiator area (m²). Grows under safe-mode forward
    /// sizing, decays under burnout.
    pub radiator_area_m2: f64,
    /// Rated rejection limit per m² of radiator (kW/m²), a hardware cap
    /// on top of the radiative limit.
    pub radiator_kw_per_m2: f64,
    pub emissivity: f64,
    /// Fraction of each orbit spent in eclipse.
    pub eclipse_fraction: f64,
    /// Radiator view-factor loss from body/panel shadowing.
    pub shadowing_loss: f64,
    pub thermal_mass_kj_per_k: f64,
    pub temp_core_c: f64,
    /// Fleet downlink capacity (Gbps).
    pub backhaul_gbps: f64,
    /// Pods the fleet can repair per tick.
    pub maintenance_capacity: f64,
    pub degraded_pods: f64,
    pub failures_unrecovered: f64,
    /// Operational capacity fraction, bounded by the mode floor.
    pub survival_fraction: f64,
    /// Radiation shielding mass (kg), fleet total.
    pub shielding_kg: f64,
    /// Fleet total mass (kg).
    pub total_mass_kg: f64,
    /// On-orbit servicing throughput, in pods per tick.
    pub repair_capacity: f64,
    /// Monotone hazard integral. Never resets.
    pub cumulative_hazard: f64,
    pub ticks_per_year: u32,
    pub shell: OrbitalShell,
    pub mode: RiskMode,
}

/// Optional parameters for [`new_state`]. The defaults describe a
/// LEO fleet in safe mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsOptions {
    pub emissivity: f64,
    pub eclipse_fraction: f64,
    pub shadowing_loss: f64,
    pub radiator_kw_per_m2: f64,
    pub thermal_mass_kj_per_k: f64,
    pub shielding_kg: f64,
    pub total_mass_kg: f64,
    pub repair_capacity: f64,
    pub ticks_per_year: u32,
    pub initial_temp_c: f64,
    pub shell: OrbitalShell,
    pub mode: RiskMode,
}

impl Default for PhysicsOptions {
    fn default() -> Self {
        Self {
            emissivity: 0.92,
            eclipse_fraction: 0.35,
            shadowing_loss: 0.10,
            radiator_kw_per_m2: 1.0,
            thermal_mass_kj_per_k: 5.0e4,
            shielding_kg: 0.0,
            total_mass_kg: 0.0,
            repair_capacity: 0.0,
            ticks_per_year: crate::constants::sim::DEFAULT_TICKS_PER_YEAR,
            initial_temp_c: 40.0,
            shell: OrbitalShell::Leo,
            mode: RiskMode::Safe,
        }
    }
}

/// Build a fresh fleet state.
pub fn new_state(
    power_kw: f64,
    compute_flops: f64,
    radiator_area_m2: f64,
    backhaul_gbps: f64,
    maintenance_capacity: f64,
    options: &PhysicsOptions,
) -> PhysicsState {
    PhysicsState {
        power_total_kw: power_kw,
        compute_raw_flops: compute_flops,
        deployed_power_kw: power_kw,
        deployed_compute_flops: compute_flops,
        radiator_area_m2,
        radiator_kw_per_m2: options.radiator_kw_per_m2,
        emissivity: options.emissivity,
        eclipse_fraction: options.eclipse_fraction,
        shadowing_loss: options.shadowing_loss,
        thermal_mass_kj_per_k: options.thermal_mass_kj_per_k,
        temp_core_c: options.initial_temp_c,
        backhaul_gbps,
        maintenance_capacity,
        degraded_pods: 0.0,
        failures_unrecovered: 0.0,
        survival_fraction: 1.0,
        shielding_kg: options.shielding_kg,
        total_mass_kg: options.total_mass_kg,
        repair_capacity: options.repair_capacity,
        cumulative_hazard: 0.0,
        ticks_per_year: options.ticks_per_year,
        shell: options.shell,
        mode: options.mode,
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Immutable per-tick output. Owned by the caller; the stepper keeps
/// nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsOutput {
    /// Heat the fleet wanted to generate this tick (kW), before throttling.
    pub waste_heat_kw: f64,
    /// Heat actually generated after any throttle (kW).
    pub heat_generated_kw: f64,
    /// Most the radiator can reject at the policy ceiling (kW).
    pub max_rejectable_kw: f64,
    /// Heat rejected at the final core temperature (kW).
    pub heat_rejected_kw: f64,
    pub net_heat_kw: f64,
    pub thermal_drift_c_per_hour: f64,
    /// Radiator utilization: generated / rejectable-at-ceiling.
    pub utilization: f64,
    pub thermal_capped: bool,
    /// Throttle applied to heat and compute; 1.0 when not capped.
    pub thermal_cap_factor: f64,
    pub temp_core_c: f64,
    pub burnout_occurred: bool,
    pub repairs_performed: f64,
    pub survival_fraction: f64,
    pub survival_forced_decay: bool,
    /// Raw compute after the thermal derate (FLOPS).
    pub compute_sustained_flops: f64,
    /// Sustained compute the downlink can actually export (FLOPS).
    pub compute_exportable_flops: f64,
    /// Final effective compute, min of all limits (FLOPS).
    pub compute_effective_flops: f64,
    /// Effective / raw; drives idle power savings.
    pub compute_utilization: f64,
}

// ============================================================================
// THERMAL RESOLUTION
// ============================================================================

/// Intermediate thermal solve for one tick.
#[derive(Debug, Clone)]
pub struct ThermalResolution {
    pub waste_heat_kw: f64,
    pub heat_generated_kw: f64,
    pub max_rejectable_kw: f64,
    pub heat_rejected_kw: f64,
    pub net_heat_kw: f64,
    pub thermal_drift_c_per_hour: f64,
    pub utilization: f64,
    pub thermal_capped: bool,
    pub thermal_cap_factor: f64,
    pub temp_core_c: f64,
    pub burnout_occurred: bool,
}

/// Average power multiplier from covering the eclipsed orbit fraction
/// through the battery round trip.
pub fn eclipse_power_factor(eclipse_fraction: f64) -> f64 {
    (1.0 - eclipse_fraction) + eclipse_fraction / BATTERY_ROUND_TRIP
}

/// Rejectable heat per m² at a given radiator temperature (kW/m²),
/// bounded by the hardware rating. Zero below the sink temperature.
pub fn rejectable_kw_per_m2(emissivity: f64, rating_kw_per_m2: f64, temp_c: f64) -> f64 {
    let t_k = temp_c + KELVIN_OFFSET;
    let radiative =
        emissivity * STEFAN_BOLTZMANN * (t_k.powi(4) - SINK_TEMP_K.powi(4)) / 1000.0;
    radiative.max(0.0).min(rating_kw_per_m2)
}

/// Closed-form equilibrium radiator temperature for a heat load (°C).
fn equilibrium_temp_c(heat_kw: f64, effective_area_m2: f64, emissivity: f64) -> f64 {
    if effective_area_m2 <= 0.0 || heat_kw <= 0.0 {
        return SINK_TEMP_K - KELVIN_OFFSET;
    }
    let q_w_per_m2 = heat_kw * 1000.0 / effective_area_m2;
    let t4 = q_w_per_m2 / (emissivity * STEFAN_BOLTZMANN) + SINK_TEMP_K.powi(4);
    t4.powf(0.25) - KELVIN_OFFSET
}

/// Solve one tick's thermal balance. Mutates radiator geometry (safe-mode
/// forward sizing, burnout decay) and the core temperature.
pub fn resolve_thermal(state: &mut PhysicsState, policy: &RiskPolicy) -> ThermalResolution {
    let leakage = 1.0 + LEAKAGE_PER_C * (state.temp_core_c - LEAKAGE_REF_C).max(0.0);
    let eclipse = eclipse_power_factor(state.eclipse_fraction);
    let power_draw_kw = state.power_total_kw * eclipse * leakage;
    let waste_heat_kw = HEAT_FRACTION * power_draw_kw;

    let per_m2_at_ceiling =
        rejectable_kw_per_m2(state.emissivity, state.radiator_kw_per_m2, policy.temp_ceiling_c);

    // Safe mode designs the radiator around the load instead of
    // throttling the load around the radiator.
    if policy.forward_sizing && waste_heat_kw > 0.0 && per_m2_at_ceiling > 0.0 {
        let needed_effective = waste_heat_kw / (SAFE_UTILIZATION_TARGET * per_m2_at_ceiling);
        let effective = state.radiator_area_m2 * (1.0 - state.shadowing_loss);
        if effective < needed_effective {
            let resized = needed_effective / (1.0 - state.shadowing_loss);
            log::debug!(
                "forward-sizing radiator {:.0} -> {:.0} m2",
                state.radiator_area_m2,
                resized
            );
            state.radiator_area_m2 = resized;
        }
    }

    let effective_area = state.radiator_area_m2 * (1.0 - state.shadowing_loss);
    let max_rejectable_kw = effective_area * per_m2_at_ceiling;

    let thermal_capped = max_rejectable_kw < waste_heat_kw;
    let (heat_generated_kw, thermal_cap_factor, temp_eq_c) = if thermal_capped {
        let t_eq_c = equilibrium_temp_c(waste_heat_kw, effective_area, state.emissivity);
        let t_ratio = (policy.temp_ceiling_c + KELVIN_OFFSET) / (t_eq_c + KELVIN_OFFSET);
        let rating_factor = if waste_heat_kw > 0.0 {
            max_rejectable_kw / waste_heat_kw
        } else {
            1.0
        };
        let factor = t_ratio.powi(4).min(rating_factor).clamp(0.0, 1.0);
        let throttled = waste_heat_kw * factor;
        // Final pass at the throttled load.
        let t_final = equilibrium_temp_c(throttled, effective_area, state.emissivity);
        (throttled, factor, t_final)
    } else {
        let t_eq_c = equilibrium_temp_c(waste_heat_kw, effective_area, state.emissivity);
        (waste_heat_kw, 1.0, t_eq_c)
    };

    // A capped tick is a tick spent pinned at the ceiling; without
    // forward sizing that erodes the radiator.
    let mut burnout_occurred = false;
    if policy.burnout_enabled && thermal_capped {
        state.radiator_area_m2 *= 1.0 - BURNOUT_DECAY;
        state.emissivity = (state.emissivity * (1.0 - BURNOUT_DECAY)).max(EMISSIVITY_FLOOR);
        burnout_occurred = true;
        log::warn!(
            "radiator burnout at {temp_eq_c:.1} C, area now {:.0} m2",
            state.radiator_area_m2
        );
    }

    let temp_core_c = temp_eq_c.clamp(policy.temp_floor_c, policy.temp_ceiling_c);
    state.temp_core_c = temp_core_c;

    let heat_rejected_kw = effective_area
        * rejectable_kw_per_m2(state.emissivity, state.radiator_kw_per_m2, temp_core_c);
    let net_heat_kw = heat_generated_kw - heat_rejected_kw;
    let thermal_drift_c_per_hour = if state.thermal_mass_kj_per_k > 0.0 {
        net_heat_kw * 3600.0 / state.thermal_mass_kj_per_k
    } else {
        0.0
    };
    let utilization = if max_rejectable_kw > 0.0 {
        heat_generated_kw / max_rejectable_kw
    } else {
        0.0
    };

    ThermalResolution {
        waste_heat_kw,
        heat_generated_kw,
        max_rejectable_kw,
        heat_rejected_kw,
        net_heat_kw,
        thermal_drift_c_per_hour,
        utilization,
        thermal_capped,
        thermal_cap_factor,
        temp_core_c,
        burnout_occurred,
    }
}

// ============================================================================
// TICK STEP
// ============================================================================

/// Advance one tick: thermal balance, then survival, then throughput.
/// The ordering is load-bearing — temperature feeds survival, survival
/// scales the raw compute the throughput resolver reduces.
///
/// Pure function of `(state, fleet_size, mode, year)` apart from the
/// mutations to `state` itself.
pub fn step_tick(
    state: &mut PhysicsState,
    fleet_size: u32,
    mode: RiskMode,
    year: u32,
) -> PhysicsOutput {
    state.mode = mode;
    let policy = mode.policy();

    let thermal = resolve_thermal(state, &policy);
    if thermal.thermal_capped {
        log::debug!(
            "year {year}: throttled to {:.3} at {:.1} C",
            thermal.thermal_cap_factor,
            thermal.temp_core_c
        );
    }
    let surv = survival::advance_survival(state, fleet_size, &policy);
    let thr = throughput::resolve_throughput(state, &thermal);

    PhysicsOutput {
        waste_heat_kw: thermal.waste_heat_kw,
        heat_generated_kw: thermal.heat_generated_kw,
        max_rejectable_kw: thermal.max_rejectable_kw,
        heat_rejected_kw: thermal.heat_rejected_kw,
        net_heat_kw: thermal.net_heat_kw,
        thermal_drift_c_per_hour: thermal.thermal_drift_c_per_hour,
        utilization: thermal.utilization,
        thermal_capped: thermal.thermal_capped,
        thermal_cap_factor: thermal.thermal_cap_factor,
        temp_core_c: thermal.temp_core_c,
        burnout_occurred: thermal.burnout_occurred,
        repairs_performed: surv.repairs_performed,
        survival_fraction: surv.survival_fraction,
        survival_forced_decay: surv.forced_decay,
        compute_sustained_flops: thr.sustained_flops,
        compute_exportable_flops: thr.exportable_flops,
        compute_effective_flops: thr.effective_flops,
        compute_utilization: thr.utilization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn safe_state(power_kw: f64) -> PhysicsState {
        new_state(
            power_kw,
            power_kw * crate::constants::units::FLOPS_PER_KW,
            100.0,
            1_000_000.0, // downlink not binding for these tests
            10.0,
            &PhysicsOptions::default(),
        )
    }

    #[test]
    fn test_policy_table() {
        let safe = RiskMode::Safe.policy();
        assert_eq!(safe.temp_floor_c, 40.0);
        assert_eq!(safe.temp_ceiling_c, 90.0);
        assert_eq!(safe.survival_floor, 0.90);
        assert!(!safe.burnout_enabled);
        assert!(safe.forward_sizing);

        let yolo = RiskMode::Yolo.policy();
        assert_eq!(yolo.survival_floor, 0.0);
        assert!(yolo.burnout_enabled);
        assert!(!yolo.forward_sizing);
    }

    #[test]
    fn test_equilibrium_closed_form() {
        // 500 W/m² through ε=0.9: T⁴ = q/(εσ) + T_sink⁴
        let t = equilibrium_temp_c(50.0, 100.0, 0.9);
        let t4 = 500.0 / (0.9 * STEFAN_BOLTZMANN) + SINK_TEMP_K.powi(4);
        let expected = t4.powf(0.25) - KELVIN_OFFSET;
        assert!((t - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_load_sits_at_sink() {
        let t = equilibrium_temp_c(0.0, 100.0, 0.9);
        assert!((t - (SINK_TEMP_K - KELVIN_OFFSET)).abs() < 1e-9);
    }

    #[test]
    fn test_safe_mode_stays_in_box() {
        let mut state = safe_state(2000.0);
        for _ in 0..24 {
            let out = step_tick(&mut state, 30, RiskMode::Safe, 0);
            assert!(
                out.temp_core_c >= 40.0 && out.temp_core_c <= 90.0,
                "temp {} outside box",
                out.temp_core_c
            );
            assert!(!out.thermal_capped, "safe mode sizes around the load");
            assert!(out.utilization <= SAFE_UTILIZATION_TARGET + 1e-9);
        }
    }

    #[test]
    fn test_safe_mode_forward_sizes_radiator() {
        let mut state = safe_state(5000.0);
        let before = state.radiator_area_m2;
        step_tick(&mut state, 30, RiskMode::Safe, 0);
        assert!(
            state.radiator_area_m2 > before,
            "100 m² cannot hold 5 MW at 90 C"
        );
    }

    #[test]
    fn test_cold_fleet_clamps_to_floor() {
        let mut state = safe_state(1.0);
        let out = step_tick(&mut state, 1, RiskMode::Safe, 0);
        assert_eq!(out.temp_core_c, 40.0);
    }

    #[test]
    fn test_overloaded_aggressive_is_capped() {
        let mut state = safe_state(5000.0);
        state.mode = RiskMode::Aggressive;
        let out = step_tick(&mut state, 30, RiskMode::Aggressive, 0);
        assert!(out.thermal_capped);
        assert!(out.thermal_cap_factor > 0.0 && out.thermal_cap_factor < 1.0);
        assert!(out.heat_generated_kw < out.waste_heat_kw);
        assert!(out.temp_core_c <= RiskMode::Aggressive.policy().temp_ceiling_c);
    }

    #[test]
    fn test_cap_flag_matches_rejection_shortfall() {
        for power in [100.0, 1000.0, 3000.0, 8000.0] {
            let mut state = safe_state(power);
            let out = step_tick(&mut state, 30, RiskMode::Aggressive, 0);
            assert_eq!(
                out.thermal_capped,
                out.max_rejectable_kw < out.waste_heat_kw,
                "power {power}"
            );
            if !out.thermal_capped {
                assert!((out.thermal_cap_factor - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_burnout_decays_radiator() {
        let mut state = safe_state(8000.0);
        let area_before = state.radiator_area_m2;
        let emissivity_before = state.emissivity;
        let out = step_tick(&mut state, 30, RiskMode::Yolo, 0);
        assert!(out.burnout_occurred);
        assert!(state.radiator_area_m2 < area_before);
        assert!(state.emissivity < emissivity_before);
    }

    #[test]
    fn test_no_burnout_in_safe_mode() {
        let mut state = safe_state(8000.0);
        let out = step_tick(&mut state, 30, RiskMode::Safe, 0);
        assert!(!out.burnout_occurred);
    }

    #[test]
    fn test_effective_never_exceeds_raw() {
        for &mode in RiskMode::all() {
            let mut state = safe_state(3000.0);
            state.backhaul_gbps = 500.0;
            for _ in 0..36 {
                let out = step_tick(&mut state, 30, mode, 1);
                assert!(
                    out.compute_effective_flops <= state.compute_raw_flops + 1e-6,
                    "{mode:?}: effective exceeded raw"
                );
            }
        }
    }

    #[test]
    fn test_stepper_keeps_nothing() {
        // Two identical states stepped independently produce identical
        // outputs — no hidden shared state.
        let mut a = safe_state(2500.0);
        let mut b = a.clone();
        let out_a = step_tick(&mut a, 30, RiskMode::Aggressive, 2);
        let out_b = step_tick(&mut b, 30, RiskMode::Aggressive, 2);
        assert_eq!(out_a.temp_core_c.to_bits(), out_b.temp_core_c.to_bits());
        assert_eq!(
            out_a.compute_effective_flops.to_bits(),
            out_b.compute_effective_flops.to_bits()
        );
        assert_eq!(a.survival_fraction.to_bits(), b.survival_fraction.to_bits());
    }

    #[test]
    fn test_rating_caps_rejection() {
        // At a 150 C ceiling the radiative limit exceeds a 1.0 kW/m²
        // rating, so the rating binds.
        let per_m2 = rejectable_kw_per_m2(0.92, 1.0, 150.0);
        assert!((per_m2 - 1.0).abs() < 1e-9);
        let unrated = rejectable_kw_per_m2(0.92, f64::INFINITY, 150.0);
        assert!(unrated > 1.0);
    }
}

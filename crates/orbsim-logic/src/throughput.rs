//! Effective compute resolution — thermal, backhaul, and survival limits.
//!
//! Exportable compute is the explicit minimum of every limit; the
//! `effective ≤ raw` invariant is enforced by the `min` chain itself,
//! not by convention. Idle silicon draws only a fraction of peak power,
//! so low utilization back-propagates into the next tick's heat load.

use serde::{Deserialize, Serialize};

use crate::constants::units::{FLOPS_PER_GBPS, FLOPS_PER_KW};
use crate::thermal::{PhysicsState, ThermalResolution, HEAT_FRACTION};

/// Fraction of peak power drawn by idle silicon.
const IDLE_POWER_FRACTION: f64 = 0.10;

/// One tick's throughput resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputResolution {
    /// Raw compute after the thermal derate (FLOPS).
    pub sustained_flops: f64,
    /// Sustained compute the downlink can carry (FLOPS).
    pub exportable_flops: f64,
    /// Final effective compute (FLOPS), `min` of every limit.
    pub effective_flops: f64,
    /// Effective / raw.
    pub utilization: f64,
    /// Power multiplier applied for the next tick.
    pub power_scale: f64,
}

/// FLOPS ceiling implied by the downlink.
pub fn backhaul_limit_flops(backhaul_gbps: f64) -> f64 {
    backhaul_gbps * FLOPS_PER_GBPS
}

/// FLOPS ceiling implied by what the radiator can reject.
pub fn thermal_limit_flops(max_rejectable_kw: f64) -> f64 {
    max_rejectable_kw / HEAT_FRACTION * FLOPS_PER_KW
}

/// Reduce the tick's limits to one effective compute figure and apply
/// the idle-power saving to the fleet power draw.
pub fn resolve_throughput(
    state: &mut PhysicsState,
    thermal: &ThermalResolution,
) -> ThroughputResolution {
    let raw = state.compute_raw_flops;
    let sustained_flops = raw * thermal.thermal_cap_factor;
    let backhaul = backhaul_limit_flops(state.backhaul_gbps);
    let thermal_ceiling = thermal_limit_flops(thermal.max_rejectable_kw);

    let exportable_flops = sustained_flops.min(backhaul);
    let effective_flops = exportable_flops.min(thermal_ceiling).min(raw);

    let utilization = if raw > 0.0 {
        effective_flops / raw
    } else {
        0.0
    };
    let power_scale = IDLE_POWER_FRACTION + (1.0 - IDLE_POWER_FRACTION) * utilization;
    state.power_total_kw *= power_scale;

    ThroughputResolution {
        sustained_flops,
        exportable_flops,
        effective_flops,
        utilization,
        power_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal::{new_state, PhysicsOptions};

    fn resolution(cap_factor: f64, max_rejectable_kw: f64) -> ThermalResolution {
        ThermalResolution {
            waste_heat_kw: 0.0,
            heat_generated_kw: 0.0,
            max_rejectable_kw,
            heat_rejected_kw: 0.0,
            net_heat_kw: 0.0,
            thermal_drift_c_per_hour: 0.0,
            utilization: 0.0,
            thermal_capped: cap_factor < 1.0,
            thermal_cap_factor: cap_factor,
            temp_core_c: 70.0,
            burnout_occurred: false,
        }
    }

    fn state_with(compute_flops: f64, backhaul_gbps: f64) -> PhysicsState {
        new_state(
            1000.0,
            compute_flops,
            100.0,
            backhaul_gbps,
            0.0,
            &PhysicsOptions::default(),
        )
    }

    #[test]
    fn test_unconstrained_runs_at_raw() {
        let mut state = state_with(1.0e18, 1.0e9);
        let out = resolve_throughput(&mut state, &resolution(1.0, 1.0e9));
        assert!((out.effective_flops - 1.0e18).abs() < 1.0);
        assert!((out.utilization - 1.0).abs() < 1e-12);
        assert!((out.power_scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_thermal_derate_binds() {
        let mut state = state_with(1.0e18, 1.0e9);
        let out = resolve_throughput(&mut state, &resolution(0.5, 1.0e9));
        assert!((out.effective_flops - 5.0e17).abs() < 1.0);
        assert!((out.sustained_flops - 5.0e17).abs() < 1.0);
    }

    #[test]
    fn test_backhaul_binds() {
        // 100 Gbps carries 1e17 FLOPS, below the 1e18 raw.
        let mut state = state_with(1.0e18, 100.0);
        let out = resolve_throughput(&mut state, &resolution(1.0, 1.0e9));
        assert!((out.effective_flops - 1.0e17).abs() < 1.0);
        assert!(out.exportable_flops < out.sustained_flops);
    }

    #[test]
    fn test_thermal_ceiling_binds() {
        // Radiator can only support ~117.6 kW of IT draw.
        let mut state = state_with(1.0e18, 1.0e9);
        let out = resolve_throughput(&mut state, &resolution(1.0, 100.0));
        let expected = 100.0 / HEAT_FRACTION * FLOPS_PER_KW;
        assert!((out.effective_flops - expected).abs() < 1.0);
    }

    #[test]
    fn test_effective_never_exceeds_raw() {
        for (cap, reject, backhaul) in [
            (1.0, 1.0e9, 1.0e9),
            (0.3, 1.0e9, 1.0e9),
            (1.0, 50.0, 1.0e9),
            (1.0, 1.0e9, 10.0),
            (0.0, 0.0, 0.0),
        ] {
            let mut state = state_with(1.0e18, backhaul);
            let out = resolve_throughput(&mut state, &resolution(cap, reject));
            assert!(out.effective_flops <= 1.0e18);
        }
    }

    #[test]
    fn test_idle_power_savings() {
        // Backhaul-starved fleet: 10% utilization → ~19% of peak power.
        let mut state = state_with(1.0e18, 100.0);
        let before = state.power_total_kw;
        let out = resolve_throughput(&mut state, &resolution(1.0, 1.0e9));
        assert!((out.utilization - 0.1).abs() < 1e-9);
        let expected_scale = 0.10 + 0.90 * 0.1;
        assert!((state.power_total_kw - before * expected_scale).abs() < 1e-6);
    }

    #[test]
    fn test_zero_raw_compute() {
        let mut state = state_with(0.0, 100.0);
        let out = resolve_throughput(&mut state, &resolution(1.0, 100.0));
        assert_eq!(out.effective_flops, 0.0);
        assert_eq!(out.utilization, 0.0);
        // Dead fleet still draws idle power.
        assert!((out.power_scale - IDLE_POWER_FRACTION).abs() < 1e-12);
    }
}

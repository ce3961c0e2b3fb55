//! Cost-per-compute models — pure functions from physical state to
//! $/PFLOP-year, plus the fleet capital cost scenario.
//!
//! Component breakdowns always report a total equal to the sum of their
//! parts; downstream accounting checks rely on that.

use serde::{Deserialize, Serialize};

// Orbital cost components in the base year ($/PFLOP-year).
const ORBITAL_LAUNCH_BASE: f64 = 400_000.0;
const ORBITAL_HARDWARE_BASE: f64 = 900_000.0;
const ORBITAL_OPERATIONS_BASE: f64 = 250_000.0;
const ORBITAL_REPLACEMENT_BASE: f64 = 300_000.0;
/// Cost reduction per doubling of cumulative deployed capacity.
const ORBITAL_LEARNING_RATE: f64 = 0.15;
/// Cumulative deployment anchoring the learning curve (PFLOPs).
const ORBITAL_REFERENCE_PFLOPS: f64 = 50.0;
/// Annual decline of orbital operations cost.
const ORBITAL_OPS_DECLINE: f64 = 0.97;

// Ground cost components in the base year ($/PFLOP-year).
const GROUND_CAPEX_BASE: f64 = 500_000.0;
const GROUND_ENERGY_BASE: f64 = 350_000.0;
const GROUND_COOLING_BASE: f64 = 150_000.0;
const GROUND_NETWORK_BASE: f64 = 100_000.0;
const GROUND_CAPEX_DECLINE: f64 = 0.93;
const GROUND_ENERGY_DECLINE: f64 = 0.99;
const GROUND_COOLING_DECLINE: f64 = 0.95;
const GROUND_NETWORK_DECLINE: f64 = 0.97;

/// Orbital $/PFLOP-year, broken into components that sum to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalCostBreakdown {
    pub year: u32,
    pub launch: f64,
    pub hardware: f64,
    pub operations: f64,
    pub replacement: f64,
    pub total: f64,
}

/// Ground $/PFLOP-year, broken into components that sum to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundCostBreakdown {
    pub year: u32,
    pub capex: f64,
    pub energy: f64,
    pub cooling: f64,
    pub network: f64,
    pub total: f64,
}

/// Wright's-law factor for a cumulative deployment. 1.0 at or below the
/// reference; monotone non-increasing in cumulative capacity.
pub fn learning_factor(cumulative_pflops: f64) -> f64 {
    let ratio = (cumulative_pflops / ORBITAL_REFERENCE_PFLOPS).max(1.0);
    let exponent = (1.0 - ORBITAL_LEARNING_RATE).log2();
    ratio.powf(exponent)
}

/// Orbital cost per PFLOP-year given cumulative deployed capacity.
/// Launch, hardware, and replacement ride the learning curve;
/// operations decline with calendar time.
pub fn orbital_cost_per_pflop_year(year: u32, cumulative_pflops: f64) -> OrbitalCostBreakdown {
    let learn = learning_factor(cumulative_pflops);
    let launch = ORBITAL_LAUNCH_BASE * learn;
    let hardware = ORBITAL_HARDWARE_BASE * learn;
    let operations = ORBITAL_OPERATIONS_BASE * ORBITAL_OPS_DECLINE.powi(year as i32);
    let replacement = ORBITAL_REPLACEMENT_BASE * learn;
    OrbitalCostBreakdown {
        year,
        launch,
        hardware,
        operations,
        replacement,
        total: launch + hardware + operations + replacement,
    }
}

/// Ground cost per PFLOP-year for a calendar year.
pub fn ground_cost_per_pflop_year(year: u32) -> GroundCostBreakdown {
    let y = year as i32;
    let capex = GROUND_CAPEX_BASE * GROUND_CAPEX_DECLINE.powi(y);
    let energy = GROUND_ENERGY_BASE * GROUND_ENERGY_DECLINE.powi(y);
    let cooling = GROUND_COOLING_BASE * GROUND_COOLING_DECLINE.powi(y);
    let network = GROUND_NETWORK_BASE * GROUND_NETWORK_DECLINE.powi(y);
    GroundCostBreakdown {
        year,
        capex,
        energy,
        cooling,
        network,
        total: capex + energy + cooling + network,
    }
}

// ============================================================================
// FLEET CAPITAL COST SCENARIO
// ============================================================================

/// Inputs for the fleet build-out capital cost scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetCostInputs {
    pub launch_cost_per_kg: f64,
    pub satellite_cost_per_w: f64,
    pub specific_power_w_per_kg: f64,
    pub satellite_power_kw: f64,
    /// Fraction of the orbit in sunlight.
    pub sun_fraction: f64,
    /// Annual solar cell output degradation.
    pub cell_degradation: f64,
    /// Target generation capacity (GW).
    pub target_gw: f64,
    /// Amortization horizon in years.
    pub years: u32,
}

impl Default for FleetCostInputs {
    fn default() -> Self {
        Self {
            launch_cost_per_kg: 1500.0,
            satellite_cost_per_w: 22.0,
            specific_power_w_per_kg: 36.5,
            satellite_power_kw: 27.0,
            sun_fraction: 0.98,
            cell_degradation: 0.025,
            target_gw: 1.0,
            years: 5,
        }
    }
}

/// Fleet capital cost summary. A pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetCostSummary {
    pub satellite_count: u64,
    pub fleet_power_w: f64,
    pub fleet_mass_kg: f64,
    pub launch_cost_usd: f64,
    pub hardware_cost_usd: f64,
    pub total_cost_usd: f64,
    pub cost_per_w_usd: f64,
    /// Energy produced over the horizon, degradation included (kWh).
    pub energy_kwh: f64,
    pub lcoe_usd_per_kwh: f64,
}

/// Capital cost of building a fleet to a target capacity, with LCOE over
/// the degraded energy actually produced.
pub fn fleet_cost(inputs: &FleetCostInputs) -> FleetCostSummary {
    let per_sat_w = inputs.satellite_power_kw * 1000.0;
    let satellite_count = (inputs.target_gw * 1.0e9 / per_sat_w).ceil() as u64;
    let fleet_power_w = satellite_count as f64 * per_sat_w;
    let fleet_mass_kg = fleet_power_w / inputs.specific_power_w_per_kg;

    let launch_cost_usd = fleet_mass_kg * inputs.launch_cost_per_kg;
    let hardware_cost_usd = fleet_power_w * inputs.satellite_cost_per_w;
    let total_cost_usd = launch_cost_usd + hardware_cost_usd;

    let mut energy_kwh = 0.0;
    for y in 0..inputs.years {
        let degradation = (1.0 - inputs.cell_degradation).powi(y as i32);
        energy_kwh +=
            fleet_power_w * inputs.sun_fraction * degradation * crate::constants::units::HOURS_PER_YEAR
                / 1000.0;
    }

    FleetCostSummary {
        satellite_count,
        fleet_power_w,
        fleet_mass_kg,
        launch_cost_usd,
        hardware_cost_usd,
        total_cost_usd,
        cost_per_w_usd: total_cost_usd / fleet_power_w,
        energy_kwh,
        lcoe_usd_per_kwh: if energy_kwh > 0.0 {
            total_cost_usd / energy_kwh
        } else {
            f64::INFINITY
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbital_components_sum_to_total() {
        for (year, cum) in [(0u32, 10.0), (5, 500.0), (15, 50_000.0)] {
            let c = orbital_cost_per_pflop_year(year, cum);
            let sum = c.launch + c.hardware + c.operations + c.replacement;
            assert!(
                (c.total - sum).abs() / c.total < 0.001,
                "orbital components drifted from total"
            );
        }
    }

    #[test]
    fn test_ground_components_sum_to_total() {
        for year in [0u32, 3, 10, 25] {
            let c = ground_cost_per_pflop_year(year);
            let sum = c.capex + c.energy + c.cooling + c.network;
            assert!((c.total - sum).abs() / c.total < 0.001);
        }
    }

    #[test]
    fn test_learning_factor_monotone() {
        let mut prev = learning_factor(1.0);
        for cum in [10.0, 50.0, 100.0, 1000.0, 1.0e5] {
            let f = learning_factor(cum);
            assert!(f <= prev);
            prev = f;
        }
    }

    #[test]
    fn test_learning_flat_below_reference() {
        assert!((learning_factor(1.0) - 1.0).abs() < 1e-12);
        assert!((learning_factor(ORBITAL_REFERENCE_PFLOPS) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_one_doubling_cuts_fifteen_percent() {
        let f = learning_factor(ORBITAL_REFERENCE_PFLOPS * 2.0);
        assert!((f - (1.0 - ORBITAL_LEARNING_RATE)).abs() < 1e-9);
    }

    #[test]
    fn test_orbital_cost_declines_with_deployment() {
        let early = orbital_cost_per_pflop_year(2, 60.0);
        let late = orbital_cost_per_pflop_year(10, 5000.0);
        assert!(late.total < early.total);
    }

    #[test]
    fn test_ground_cost_declines_monotonically() {
        let mut prev = ground_cost_per_pflop_year(0).total;
        for year in 1..20 {
            let total = ground_cost_per_pflop_year(year).total;
            assert!(total < prev);
            prev = total;
        }
    }

    #[test]
    fn test_fleet_cost_reference_scenario() {
        let summary = fleet_cost(&FleetCostInputs::default());
        // 1 GW at 27 kW per satellite.
        assert_eq!(summary.satellite_count, 37_038);
        assert!(summary.fleet_power_w >= 1.0e9);
        // ~740 kg per satellite at 36.5 W/kg.
        let per_sat_kg = summary.fleet_mass_kg / summary.satellite_count as f64;
        assert!((per_sat_kg - 27_000.0 / 36.5).abs() < 0.1);
        assert!(summary.total_cost_usd > 0.0);
        assert!(summary.cost_per_w_usd > 0.0);
        assert!(summary.lcoe_usd_per_kwh > 0.0);
    }

    #[test]
    fn test_fleet_cost_deterministic() {
        let a = fleet_cost(&FleetCostInputs::default());
        let b = fleet_cost(&FleetCostInputs::default());
        assert_eq!(a.total_cost_usd.to_bits(), b.total_cost_usd.to_bits());
        assert_eq!(a.cost_per_w_usd.to_bits(), b.cost_per_w_usd.to_bits());
        assert_eq!(
            a.lcoe_usd_per_kwh.to_bits(),
            b.lcoe_usd_per_kwh.to_bits()
        );
    }

    #[test]
    fn test_cheaper_launch_lowers_cost_per_w() {
        let base = fleet_cost(&FleetCostInputs::default());
        let cheap = fleet_cost(&FleetCostInputs {
            launch_cost_per_kg: 200.0,
            ..FleetCostInputs::default()
        });
        assert!(cheap.cost_per_w_usd < base.cost_per_w_usd);
        assert_eq!(cheap.satellite_count, base.satellite_count);
    }

    #[test]
    fn test_degradation_reduces_energy() {
        let degraded = fleet_cost(&FleetCostInputs::default());
        let pristine = fleet_cost(&FleetCostInputs {
            cell_degradation: 0.0,
            ..FleetCostInputs::default()
        });
        assert!(pristine.energy_kwh > degraded.energy_kwh);
        assert!(pristine.lcoe_usd_per_kwh < degraded.lcoe_usd_per_kwh);
    }
}

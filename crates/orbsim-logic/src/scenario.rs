//! Scenario configuration, derived sizing, and the end-to-end driver.
//!
//! A `ScenarioConfig` holds every knob for one simulation run.
//! Validation collects all problems rather than stopping at the first;
//! an invalid scenario is a caller error and the run refuses to start.
//! Derived values (radiator sizing, per-satellite mass, launch cost) are
//! evaluated in dependency order with a fixed pass cap as a safety net.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carbon::{self, CarbonYear};
use crate::constants::units;
use crate::costs::{self, FleetCostInputs, GroundCostBreakdown, OrbitalCostBreakdown};
use crate::deployment::{
    self, DeploymentError, DeploymentResult, DeploymentState, GrowthStrategy, OrbitalShell,
};
use crate::economy::{self, YearState};
use crate::runlog::{RunEvent, RunLog};
use crate::thermal::{self, PhysicsOptions, RiskMode};

/// Upper bound on derived-value resolution passes. Ordered evaluation
/// settles in two; the cap only exists to bound a misconfigured cycle.
pub const MAX_RESOLVE_PASSES: u32 = 10;

/// Deployable radiator areal density (kg/m²).
const RADIATOR_KG_PER_M2: f64 = 3.5;
/// Structure/harness mass overhead on top of payload and radiator.
const STRUCTURE_OVERHEAD: f64 = 0.15;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Full configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub years: u32,
    pub ticks_per_year: u32,
    /// Strategy for every year not covered by `strategy_plan`.
    pub strategy: GrowthStrategy,
    /// Optional per-year strategy overrides, indexed from year 0.
    pub strategy_plan: Vec<GrowthStrategy>,
    pub mode: RiskMode,
    pub initial_fleet: DeploymentState,
    pub radiator_m2_per_sat: f64,
    pub radiator_kw_per_m2: f64,
    pub emissivity: f64,
    pub eclipse_fraction: f64,
    pub shadowing_loss: f64,
    pub backhaul_gbps_per_sat: f64,
    /// Fleet repair throughput (pods/tick) at the initial fleet size;
    /// scales with the fleet.
    pub maintenance_capacity: f64,
    /// On-orbit servicing throughput (pods/tick).
    pub repair_capacity: f64,
    /// Radiation shielding as a fraction of satellite dry mass.
    pub shielding_fraction: f64,
    pub specific_power_w_per_kg: f64,
    pub fleet_inputs: FleetCostInputs,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "baseline".to_string(),
            years: 15,
            ticks_per_year: crate::constants::sim::DEFAULT_TICKS_PER_YEAR,
            strategy: GrowthStrategy::Balanced,
            strategy_plan: Vec::new(),
            mode: RiskMode::Safe,
            initial_fleet: DeploymentState::default(),
            radiator_m2_per_sat: 100.0,
            radiator_kw_per_m2: 1.0,
            emissivity: 0.92,
            eclipse_fraction: 0.35,
            shadowing_loss: 0.10,
            backhaul_gbps_per_sat: 200.0,
            maintenance_capacity: 5.0,
            repair_capacity: 0.0,
            shielding_fraction: 0.12,
            specific_power_w_per_kg: 36.5,
            fleet_inputs: FleetCostInputs::default(),
            seed: 42,
        }
    }
}

/// Scenario validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("scenario name is empty")]
    EmptyName,
    #[error("year count {0} out of range 1..=40")]
    YearsOutOfRange(u32),
    #[error("ticks per year must be at least 1")]
    NoTicks,
    #[error("emissivity {0} outside (0, 1]")]
    EmissivityOutOfRange(f64),
    #[error("eclipse fraction {0} outside [0, 0.9]")]
    EclipseOutOfRange(f64),
    #[error("shadowing loss {0} outside [0, 0.9]")]
    ShadowingOutOfRange(f64),
    #[error("shielding fraction {0} outside [0, 0.9]")]
    ShieldingOutOfRange(f64),
    #[error("radiator area {0} must be positive")]
    NonPositiveRadiator(f64),
    #[error("specific power {0} must be positive")]
    NonPositiveSpecificPower(f64),
    #[error("initial fleet has no satellites")]
    EmptyFleet,
    #[error("{shell} seed power {power_kw} kW below its floor")]
    SeedPowerBelowFloor { shell: &'static str, power_kw: f64 },
}

/// Validate a scenario, returning every problem found.
pub fn validate_scenario(config: &ScenarioConfig) -> Vec<ScenarioError> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ScenarioError::EmptyName);
    }
    // Growth compounds; 40 years of build-out is already a million-sat
    // fleet and the ceiling keeps counts comfortably inside u32.
    if config.years == 0 || config.years > 40 {
        errors.push(ScenarioError::YearsOutOfRange(config.years));
    }
    if config.ticks_per_year == 0 {
        errors.push(ScenarioError::NoTicks);
    }
    if config.emissivity <= 0.0 || config.emissivity > 1.0 {
        errors.push(ScenarioError::EmissivityOutOfRange(config.emissivity));
    }
    if !(0.0..=0.9).contains(&config.eclipse_fraction) {
        errors.push(ScenarioError::EclipseOutOfRange(config.eclipse_fraction));
    }
    if !(0.0..=0.9).contains(&config.shadowing_loss) {
        errors.push(ScenarioError::ShadowingOutOfRange(config.shadowing_loss));
    }
    if !(0.0..=0.9).contains(&config.shielding_fraction) {
        errors.push(ScenarioError::ShieldingOutOfRange(config.shielding_fraction));
    }
    if config.radiator_m2_per_sat <= 0.0 {
        errors.push(ScenarioError::NonPositiveRadiator(config.radiator_m2_per_sat));
    }
    if config.specific_power_w_per_kg <= 0.0 {
        errors.push(ScenarioError::NonPositiveSpecificPower(
            config.specific_power_w_per_kg,
        ));
    }
    if config.initial_fleet.total_satellites() == 0 {
        errors.push(ScenarioError::EmptyFleet);
    }
    // Floors active from year 0 must hold at the seed too.
    for (shell, power) in [
        (OrbitalShell::Leo, config.initial_fleet.power_leo_kw),
        (OrbitalShell::Meo, config.initial_fleet.power_meo_kw),
    ] {
        let info = shell.info();
        if power < info.power_floor_kw {
            errors.push(ScenarioError::SeedPowerBelowFloor {
                shell: info.name,
                power_kw: power,
            });
        }
    }

    errors
}

// ============================================================================
// DERIVED VALUES
// ============================================================================

/// Values derived from a scenario before the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedValues {
    /// Radiator area per satellite after any safe-mode design sizing.
    pub radiator_m2_per_sat: f64,
    pub fleet_radiator_m2: f64,
    pub per_sat_mass_kg: f64,
    pub fleet_mass_kg: f64,
    pub fleet_shielding_kg: f64,
    pub launch_cost_usd: f64,
    pub fleet_power_mw: f64,
    pub fleet_compute_pflops: f64,
    /// Resolution passes actually used.
    pub resolve_passes: u32,
}

/// Resolve derived values in dependency order: power → heat → radiator
/// area → radiator mass → satellite mass → shielding → launch cost.
/// Nothing downstream feeds back into power, so ordered evaluation
/// settles immediately; the pass loop is a bounded safety net, not the
/// mechanism.
pub fn resolve_derived(config: &ScenarioConfig) -> DerivedValues {
    let sats = config.initial_fleet.total_satellites().max(1) as f64;
    let avg_power_kw = config.initial_fleet.total_power_kw() / sats;
    let policy = config.mode.policy();

    let per_m2 = thermal::rejectable_kw_per_m2(
        config.emissivity,
        config.radiator_kw_per_m2,
        policy.temp_ceiling_c,
    );
    let waste_kw = thermal::HEAT_FRACTION
        * avg_power_kw
        * thermal::eclipse_power_factor(config.eclipse_fraction);

    let mut area = config.radiator_m2_per_sat;
    let mut passes = 0;
    while passes < MAX_RESOLVE_PASSES {
        passes += 1;
        let next = if policy.forward_sizing && per_m2 > 0.0 {
            let required_effective = waste_kw / (thermal::SAFE_UTILIZATION_TARGET * per_m2);
            (required_effective / (1.0 - config.shadowing_loss)).max(config.radiator_m2_per_sat)
        } else {
            config.radiator_m2_per_sat
        };
        if (next - area).abs() < 1e-9 {
            area = next;
            break;
        }
        area = next;
    }

    let payload_kg = avg_power_kw * 1000.0 / config.specific_power_w_per_kg;
    let radiator_kg = area * RADIATOR_KG_PER_M2;
    let dry_kg = payload_kg + radiator_kg;
    let shielding_kg = config.shielding_fraction * dry_kg;
    let per_sat_mass_kg = (dry_kg + shielding_kg) * (1.0 + STRUCTURE_OVERHEAD);

    let fleet_mass_kg = per_sat_mass_kg * sats;
    let fleet_power_kw = config.initial_fleet.total_power_kw();

    DerivedValues {
        radiator_m2_per_sat: area,
        fleet_radiator_m2: area * sats,
        per_sat_mass_kg,
        fleet_mass_kg,
        fleet_shielding_kg: shielding_kg * sats,
        launch_cost_usd: fleet_mass_kg * config.fleet_inputs.launch_cost_per_kg,
        fleet_power_mw: fleet_power_kw / 1000.0,
        fleet_compute_pflops: fleet_power_kw * units::FLOPS_PER_KW / units::FLOPS_PER_PFLOP,
        resolve_passes: passes,
    }
}

// ============================================================================
// RANDOMIZED SCENARIOS
// ============================================================================

/// Produce a valid, varied scenario for sweep testing.
pub fn randomize_scenario(seed: u64) -> ScenarioConfig {
    let mut rng = StdRng::seed_from_u64(seed);

    let strategy = GrowthStrategy::all()[rng.gen_range(0..GrowthStrategy::all().len())];
    let mode = RiskMode::all()[rng.gen_range(0..RiskMode::all().len())];

    let initial_fleet = DeploymentState {
        year: 0,
        n_leo: rng.gen_range(10..=60),
        n_meo: rng.gen_range(2..=12),
        n_geo: rng.gen_range(1..=4),
        power_leo_kw: rng.gen_range(60.0..=150.0),
        power_meo_kw: rng.gen_range(300.0..=600.0),
        power_geo_kw: rng.gen_range(1100.0..=2000.0),
    };

    ScenarioConfig {
        name: format!("sweep-{seed}"),
        years: rng.gen_range(8..=25),
        strategy,
        mode,
        initial_fleet,
        radiator_m2_per_sat: rng.gen_range(60.0..=200.0),
        emissivity: rng.gen_range(0.85..=0.95),
        eclipse_fraction: rng.gen_range(0.20..=0.45),
        shadowing_loss: rng.gen_range(0.05..=0.20),
        backhaul_gbps_per_sat: rng.gen_range(50.0..=400.0),
        maintenance_capacity: rng.gen_range(1.0..=10.0),
        repair_capacity: rng.gen_range(0.0..=5.0),
        shielding_fraction: rng.gen_range(0.05..=0.25),
        seed,
        ..ScenarioConfig::default()
    }
}

// ============================================================================
// END-TO-END RUN
// ============================================================================

/// Per-tick snapshot of the physics state, kept alongside the outputs
/// for trajectory-level checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub year: u32,
    pub tick: u32,
    pub mode: RiskMode,
    pub temp_core_c: f64,
    pub survival_fraction: f64,
    pub compute_raw_flops: f64,
    pub compute_effective_flops: f64,
}

/// A completed simulation run — the single source of truth every
/// downstream consumer reads. Records are appended once and never
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub config: ScenarioConfig,
    pub derived: DerivedValues,
    pub deployment: Vec<DeploymentResult>,
    pub ticks: Vec<crate::thermal::PhysicsOutput>,
    pub snapshots: Vec<TickSnapshot>,
    pub orbital_costs: Vec<OrbitalCostBreakdown>,
    pub ground_costs: Vec<GroundCostBreakdown>,
    pub carbon: Vec<CarbonYear>,
    pub economy: Vec<YearState>,
    /// Mean exportable compute per year (PFLOPs).
    pub exportable_pflops_by_year: Vec<f64>,
}

/// Why a run refused to start or halted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("invalid scenario: {0:?}")]
    InvalidScenario(Vec<ScenarioError>),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
}

/// Shell hosting the most satellites, used for the fleet-level hazard
/// environment.
fn dominant_shell(fleet: &DeploymentState) -> OrbitalShell {
    let counts = [
        (fleet.n_leo, OrbitalShell::Leo),
        (fleet.n_meo, OrbitalShell::Meo),
        (fleet.n_geo, OrbitalShell::Geo),
    ];
    counts
        .iter()
        .max_by_key(|(n, _)| *n)
        .map(|&(_, s)| s)
        .unwrap_or(OrbitalShell::Leo)
}

/// Run a full scenario: deployment, per-tick physics, costs, carbon,
/// and the economic trajectory. Strictly sequential; year N only ever
/// reads year N-1's finalized output.
pub fn run_scenario(config: &ScenarioConfig, log: &mut RunLog) -> Result<SimulationRun, RunError> {
    let errors = validate_scenario(config);
    if !errors.is_empty() {
        return Err(RunError::InvalidScenario(errors));
    }

    let derived = resolve_derived(config);

    let strategies: Vec<GrowthStrategy> = (0..config.years as usize)
        .map(|y| {
            config
                .strategy_plan
                .get(y)
                .copied()
                .unwrap_or(config.strategy)
        })
        .collect();
    let deployment_trajectory = deployment::run_plan(&config.initial_fleet, &strategies, log)?;

    let initial_sats = config.initial_fleet.total_satellites();
    let initial_power_kw = config.initial_fleet.total_power_kw();
    let initial_compute_flops = initial_power_kw * units::FLOPS_PER_KW;

    let options = PhysicsOptions {
        emissivity: config.emissivity,
        eclipse_fraction: config.eclipse_fraction,
        shadowing_loss: config.shadowing_loss,
        radiator_kw_per_m2: config.radiator_kw_per_m2,
        shielding_kg: derived.fleet_shielding_kg,
        total_mass_kg: derived.fleet_mass_kg,
        repair_capacity: config.repair_capacity,
        ticks_per_year: config.ticks_per_year,
        shell: dominant_shell(&config.initial_fleet),
        mode: config.mode,
        ..PhysicsOptions::default()
    };
    let mut state = thermal::new_state(
        initial_power_kw,
        initial_compute_flops,
        derived.fleet_radiator_m2,
        config.backhaul_gbps_per_sat * initial_sats as f64,
        config.maintenance_capacity,
        &options,
    );

    let mut ticks = Vec::new();
    let mut snapshots = Vec::new();
    let mut orbital_costs = Vec::new();
    let mut ground_costs = Vec::new();
    let mut exportable_pflops_by_year = Vec::new();

    for result in &deployment_trajectory {
        // Rebase the physics state onto this year's deployed fleet. New
        // satellites bring radiators in proportion to their power.
        let new_deployed_kw = result.total_power_mw * 1000.0;
        let growth_ratio = if state.deployed_power_kw > 0.0 {
            new_deployed_kw / state.deployed_power_kw
        } else {
            1.0
        };
        state.radiator_area_m2 *= growth_ratio;
        state.deployed_power_kw = new_deployed_kw;
        state.deployed_compute_flops = result.total_compute_pflops * units::FLOPS_PER_PFLOP;
        state.power_total_kw = state.deployed_power_kw * state.survival_fraction;
        state.compute_raw_flops = state.deployed_compute_flops * state.survival_fraction;
        state.backhaul_gbps = config.backhaul_gbps_per_sat * result.total_satellites() as f64;
        state.maintenance_capacity = config.maintenance_capacity
            * result.total_satellites() as f64
            / initial_sats.max(1) as f64;

        let fleet_size = result.total_satellites();
        let mut exportable_sum = 0.0;
        for tick in 0..config.ticks_per_year {
            let out = thermal::step_tick(&mut state, fleet_size, config.mode, result.year);
            if out.thermal_capped {
                log.push(RunEvent::ThermalThrottle {
                    year: result.year,
                    tick,
                    factor: out.thermal_cap_factor,
                });
            }
            if out.burnout_occurred {
                log.push(RunEvent::Burnout {
                    year: result.year,
                    tick,
                });
            }
            if out.survival_forced_decay {
                log.push(RunEvent::ForcedSurvivalDecay {
                    year: result.year,
                    tick,
                });
            }
            exportable_sum += out.compute_exportable_flops;
            snapshots.push(TickSnapshot {
                year: result.year,
                tick,
                mode: config.mode,
                temp_core_c: out.temp_core_c,
                survival_fraction: out.survival_fraction,
                compute_raw_flops: state.compute_raw_flops,
                compute_effective_flops: out.compute_effective_flops,
            });
            ticks.push(out);
        }
        exportable_pflops_by_year
            .push(exportable_sum / config.ticks_per_year as f64 / units::FLOPS_PER_PFLOP);

        let economic_year = result.year - 1;
        orbital_costs.push(costs::orbital_cost_per_pflop_year(
            economic_year,
            result.total_compute_pflops,
        ));
        ground_costs.push(costs::ground_cost_per_pflop_year(economic_year));
    }

    let carbon = carbon::carbon_series(config.years);
    let orbital_price_series: Vec<f64> = orbital_costs.iter().map(|c| c.total).collect();
    let economy = economy::run_trajectory(config.years, &orbital_price_series, log);

    Ok(SimulationRun {
        config: config.clone(),
        derived,
        deployment: deployment_trajectory,
        ticks,
        snapshots,
        orbital_costs,
        ground_costs,
        carbon,
        economy,
        exportable_pflops_by_year,
    })
}

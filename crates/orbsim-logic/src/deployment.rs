//! Fleet deployment growth — per-shell satellite counts and power, year over year.
//!
//! Growth follows a phase schedule (flat seed years, a steep build-out,
//! then maturity) scaled by the chosen strategy. Transitions that shrink
//! the fleet or drop per-satellite power below a shell's floor are
//! configuration errors and fail immediately rather than being clamped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::units;
use crate::runlog::{RunEvent, RunLog};

// ============================================================================
// ORBITAL SHELLS
// ============================================================================

/// Orbital shell a satellite population occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrbitalShell {
    Leo = 0,
    Meo = 1,
    Geo = 2,
}

/// Per-shell environment and deployment limits.
#[derive(Debug, Clone)]
pub struct ShellInfo {
    pub name: &'static str,
    pub altitude_km: f64,
    /// One-way user latency in milliseconds.
    pub latency_ms: f64,
    /// Minimum viable per-satellite power (kW).
    pub power_floor_kw: f64,
    /// First year the floor is enforced.
    pub floor_from_year: u32,
    /// Radiation hazard relative to LEO.
    pub radiation_factor: f64,
}

impl OrbitalShell {
    pub fn info(&self) -> ShellInfo {
        match self {
            Self::Leo => ShellInfo {
                name: "LEO",
                altitude_km: 550.0,
                latency_ms: 4.0,
                power_floor_kw: 50.0,
                floor_from_year: 0,
                radiation_factor: 1.0,
            },
            Self::Meo => ShellInfo {
                name: "MEO",
                altitude_km: 8000.0,
                latency_ms: 40.0,
                power_floor_kw: 250.0,
                floor_from_year: 0,
                radiation_factor: 1.6,
            },
            Self::Geo => ShellInfo {
                name: "GEO",
                altitude_km: 35_786.0,
                latency_ms: 120.0,
                power_floor_kw: 1000.0,
                floor_from_year: 6,
                radiation_factor: 2.2,
            },
        }
    }

    pub fn all() -> &'static [OrbitalShell] {
        &[Self::Leo, Self::Meo, Self::Geo]
    }
}

// ============================================================================
// GROWTH STRATEGIES
// ============================================================================

/// Deployment strategy — what the build-out is optimized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GrowthStrategy {
    /// Build fast and low: LEO-heavy, aggressive power growth.
    Latency = 0,
    /// Cheapest $/PFLOP: slower growth, mid-shell mix.
    Cost = 1,
    /// Lowest embodied carbon: fewest launches, modest power growth.
    Carbon = 2,
    /// Even trade-off across the three.
    Balanced = 3,
}

/// Strategy tuning: overall growth scale, shell split, and per-shell
/// annual power compounding.
#[derive(Debug, Clone)]
pub struct StrategyProfile {
    pub name: &'static str,
    pub growth_multiplier: f64,
    /// New-satellite distribution across [LEO, MEO, GEO]. Sums to 1.
    pub shell_weights: [f64; 3],
    /// Annual per-satellite power growth per shell.
    pub power_growth: [f64; 3],
}

impl GrowthStrategy {
    pub fn profile(&self) -> StrategyProfile {
        match self {
            Self::Latency => StrategyProfile {
                name: "latency",
                growth_multiplier: 1.25,
                shell_weights: [0.80, 0.15, 0.05],
                power_growth: [0.06, 0.05, 0.04],
            },
            Self::Cost => StrategyProfile {
                name: "cost",
                growth_multiplier: 0.85,
                shell_weights: [0.55, 0.30, 0.15],
                power_growth: [0.04, 0.04, 0.03],
            },
            Self::Carbon => StrategyProfile {
                name: "carbon",
                growth_multiplier: 0.70,
                shell_weights: [0.50, 0.30, 0.20],
                power_growth: [0.05, 0.04, 0.03],
            },
            Self::Balanced => StrategyProfile {
                name: "balanced",
                growth_multiplier: 1.0,
                shell_weights: [0.65, 0.20, 0.15],
                power_growth: [0.05, 0.045, 0.035],
            },
        }
    }

    pub fn all() -> &'static [GrowthStrategy] {
        &[Self::Latency, Self::Cost, Self::Carbon, Self::Balanced]
    }
}

/// Base fleet growth rate by simulation year: two flat seed years, a
/// steep build-out, a peak phase, then maturity.
pub fn base_growth_rate(year: u32) -> f64 {
    match year {
        0 | 1 => 0.0,
        2..=4 => 0.60,
        5..=7 => 0.90,
        _ => 0.35,
    }
}

// ============================================================================
// STATE AND RESULTS
// ============================================================================

/// Fleet composition at the end of a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub year: u32,
    pub n_leo: u32,
    pub n_meo: u32,
    pub n_geo: u32,
    /// Per-satellite power by shell (kW).
    pub power_leo_kw: f64,
    pub power_meo_kw: f64,
    pub power_geo_kw: f64,
}

impl Default for DeploymentState {
    fn default() -> Self {
        Self {
            year: 0,
            n_leo: 24,
            n_meo: 6,
            n_geo: 2,
            power_leo_kw: 80.0,
            power_meo_kw: 400.0,
            power_geo_kw: 1200.0,
        }
    }
}

impl DeploymentState {
    pub fn total_satellites(&self) -> u32 {
        self.n_leo + self.n_meo + self.n_geo
    }

    /// Total fleet IT power in kW.
    pub fn total_power_kw(&self) -> f64 {
        self.n_leo as f64 * self.power_leo_kw
            + self.n_meo as f64 * self.power_meo_kw
            + self.n_geo as f64 * self.power_geo_kw
    }
}

/// One year's deployment outcome. Append-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub year: u32,
    pub strategy: GrowthStrategy,
    pub n_leo: u32,
    pub n_meo: u32,
    pub n_geo: u32,
    pub power_leo_kw: f64,
    pub power_meo_kw: f64,
    pub power_geo_kw: f64,
    /// Satellites added this year.
    pub delta_total: u32,
    /// Fleet raw compute in PFLOPs.
    pub total_compute_pflops: f64,
    /// Fleet IT power in MW.
    pub total_power_mw: f64,
}

impl DeploymentResult {
    pub fn total_satellites(&self) -> u32 {
        self.n_leo + self.n_meo + self.n_geo
    }

    /// The state this result describes, for feeding into the next year.
    pub fn to_state(&self) -> DeploymentState {
        DeploymentState {
            year: self.year,
            n_leo: self.n_leo,
            n_meo: self.n_meo,
            n_geo: self.n_geo,
            power_leo_kw: self.power_leo_kw,
            power_meo_kw: self.power_meo_kw,
            power_geo_kw: self.power_geo_kw,
        }
    }
}

/// Invalid deployment transitions. These are model-configuration errors,
/// not runtime conditions, and halt the computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeploymentError {
    #[error("negative satellite delta {delta} in year {year}")]
    NegativeDelta { year: u32, delta: i64 },
    #[error("fleet shrank from {from} to {to} satellites in year {year}")]
    FleetShrank { year: u32, from: u32, to: u32 },
    #[error("{shell} per-satellite power {power_kw:.1} kW below floor {floor_kw:.1} kW in year {year}")]
    PowerBelowFloor {
        year: u32,
        shell: &'static str,
        power_kw: f64,
        floor_kw: f64,
    },
}

// ============================================================================
// YEARLY STEP
// ============================================================================

/// Advance the fleet by one year under the given strategy.
pub fn step_year(
    state: &DeploymentState,
    strategy: GrowthStrategy,
) -> Result<DeploymentResult, DeploymentError> {
    let year = state.year + 1;
    let profile = strategy.profile();
    let total = state.total_satellites();

    let rate = base_growth_rate(year) * profile.growth_multiplier;
    let delta_f = total as f64 * rate;
    let delta_total = delta_f.round() as i64;
    if delta_total < 0 {
        return Err(DeploymentError::NegativeDelta {
            year,
            delta: delta_total,
        });
    }
    let delta_total = delta_total as u32;

    // Split new satellites across shells; LEO absorbs rounding remainder.
    let delta_meo = (delta_total as f64 * profile.shell_weights[1]).round() as u32;
    let delta_geo = (delta_total as f64 * profile.shell_weights[2]).round() as u32;
    let assigned = delta_meo + delta_geo;
    if assigned > delta_total {
        return Err(DeploymentError::NegativeDelta {
            year,
            delta: delta_total as i64 - assigned as i64,
        });
    }
    let delta_leo = delta_total - assigned;

    let n_leo = state.n_leo + delta_leo;
    let n_meo = state.n_meo + delta_meo;
    let n_geo = state.n_geo + delta_geo;
    let new_total = n_leo + n_meo + n_geo;
    if new_total < total {
        return Err(DeploymentError::FleetShrank {
            year,
            from: total,
            to: new_total,
        });
    }

    let power_leo_kw = state.power_leo_kw * (1.0 + profile.power_growth[0]);
    let power_meo_kw = state.power_meo_kw * (1.0 + profile.power_growth[1]);
    let power_geo_kw = state.power_geo_kw * (1.0 + profile.power_growth[2]);

    for (shell, power) in [
        (OrbitalShell::Leo, power_leo_kw),
        (OrbitalShell::Meo, power_meo_kw),
        (OrbitalShell::Geo, power_geo_kw),
    ] {
        let info = shell.info();
        if year >= info.floor_from_year && power < info.power_floor_kw {
            return Err(DeploymentError::PowerBelowFloor {
                year,
                shell: info.name,
                power_kw: power,
                floor_kw: info.power_floor_kw,
            });
        }
    }

    let total_power_kw = n_leo as f64 * power_leo_kw
        + n_meo as f64 * power_meo_kw
        + n_geo as f64 * power_geo_kw;
    let total_compute_pflops = total_power_kw * units::FLOPS_PER_KW / units::FLOPS_PER_PFLOP;

    Ok(DeploymentResult {
        year,
        strategy,
        n_leo,
        n_meo,
        n_geo,
        power_leo_kw,
        power_meo_kw,
        power_geo_kw,
        delta_total,
        total_compute_pflops,
        total_power_mw: total_power_kw / 1000.0,
    })
}

/// Run a multi-year deployment plan, one strategy per year. The produced
/// trajectory is append-only; each year is computed solely from the
/// previous year's finalized result.
pub fn run_plan(
    initial: &DeploymentState,
    strategies: &[GrowthStrategy],
    log: &mut RunLog,
) -> Result<Vec<DeploymentResult>, DeploymentError> {
    let mut trajectory = Vec::with_capacity(strategies.len());
    let mut state = initial.clone();
    let mut prev_strategy: Option<GrowthStrategy> = None;

    for &strategy in strategies {
        if prev_strategy.is_some() && prev_strategy != Some(strategy) {
            log.push(RunEvent::StrategyChange {
                year: state.year + 1,
                strategy: strategy.profile().name.to_string(),
            });
        }
        prev_strategy = Some(strategy);

        let result = step_year(&state, strategy)?;
        state = result.to_state();
        trajectory.push(result);
    }
    Ok(trajectory)
}

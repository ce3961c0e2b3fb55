//! Ground compute market — demand, supply, and price, year over year.
//!
//! The year loop is strictly sequential. Demand is computed from the
//! *smoothed* prices of the previous iteration, not the raw ones; the
//! smoothed prices are the only feedback channel between years, which is
//! what keeps the price/demand loop from oscillating.
//!
//! Scarcity rent uses the saturating, capped log form. It is zero at
//! zero wait, monotone in wait time, and flat once the wait passes ten
//! years.

use serde::{Deserialize, Serialize};

use crate::runlog::{RunEvent, RunLog};

pub mod econ_constants {
    /// Exogenous compute demand in the base year (PFLOPs).
    pub const BASE_DEMAND_PFLOPS: f64 = 5000.0;
    /// Annual growth of exogenous demand.
    pub const DEMAND_GROWTH: f64 = 0.18;
    /// Price elasticity of ground demand.
    pub const PRICE_ELASTICITY: f64 = 0.6;
    /// Reference price anchoring the elasticity curve ($/PFLOP-year).
    pub const REFERENCE_PRICE: f64 = 1_200_000.0;
    /// Ground price in the base year ($/PFLOP-year).
    pub const GROUND_BASE_PRICE: f64 = 1_200_000.0;
    /// Annual price decline factor from hardware improvement.
    pub const MOORE_DECLINE: f64 = 0.82;
    /// Weight on the current year when updating smoothed prices.
    pub const PRICE_SMOOTHING_ALPHA: f64 = 0.3;
    /// Scarcity rent coefficient. The multiplier caps at 1 + this,
    /// which the log form reaches at a ten-year wait.
    pub const SCARCITY_K: f64 = 0.4;
    /// Largest orbital share move per year (fraction, i.e. 10 points).
    pub const MAX_SHARE_SHIFT: f64 = 0.10;
    /// Ceiling on the orbital substitution share.
    pub const MAX_ORBITAL_SHARE: f64 = 0.85;
    /// Logistic steepness of the substitution target.
    pub const SUBSTITUTION_STEEPNESS: f64 = 8.0;
    /// Price advantage at which half the ceiling share substitutes.
    pub const SUBSTITUTION_MIDPOINT: f64 = 0.10;
    /// Installed ground capacity in the base year (PFLOPs).
    pub const BASE_CAPACITY_PFLOPS: f64 = 4000.0;
    /// Annual ground build rate as a fraction of installed capacity.
    pub const BUILD_RATE: f64 = 0.20;
    /// Hard cap on the annual build fraction.
    pub const BUILD_RATE_CAP: f64 = 0.25;
}

use econ_constants::*;

/// Demand resolution for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandResult {
    pub year: u32,
    /// Exogenous demand before price response (PFLOPs).
    pub baseline_pflops: f64,
    /// Demand served on the ground (PFLOPs).
    pub ground_demand_pflops: f64,
    /// Fraction of total demand substituted to orbit.
    pub orbital_share: f64,
    pub orbital_demand_pflops: f64,
}

/// Ground supply resolution for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyResult {
    pub year: u32,
    pub capacity_pflops: f64,
    pub build_rate_pflops: f64,
    pub backlog_pflops: f64,
    pub wait_years: f64,
    pub scarcity_multiplier: f64,
}

/// Ground price resolution for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResult {
    pub year: u32,
    pub base_price: f64,
    pub scarcity_multiplier: f64,
    pub price_per_pflop_year: f64,
}

/// One finalized year of the economic trajectory. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearState {
    pub year: u32,
    pub demand: DemandResult,
    pub supply: SupplyResult,
    pub price: PriceResult,
    pub orbital_price: f64,
    /// Carried forward as the only feedback into next year's demand.
    pub smoothed_ground_price: f64,
    pub smoothed_orbital_price: f64,
}

/// Saturating scarcity multiplier. Zero rent at zero wait; flat at
/// `1 + SCARCITY_K` from a ten-year wait on.
pub fn scarcity_multiplier(wait_years: f64) -> f64 {
    let raw = 1.0 + SCARCITY_K * wait_years.max(0.5).log10();
    raw.clamp(1.0, 1.0 + SCARCITY_K)
}

/// Logistic substitution target for a given relative price advantage.
fn substitution_target(price_advantage: f64) -> f64 {
    MAX_ORBITAL_SHARE
        / (1.0 + (-SUBSTITUTION_STEEPNESS * (price_advantage - SUBSTITUTION_MIDPOINT)).exp())
}

/// Resolve demand from last year's smoothed prices.
pub fn calculate_demand(
    year: u32,
    smoothed_ground_price: f64,
    smoothed_orbital_price: f64,
    prev_orbital_share: f64,
) -> DemandResult {
    let baseline_pflops = BASE_DEMAND_PFLOPS * (1.0 + DEMAND_GROWTH).powi(year as i32);
    let price_factor = (REFERENCE_PRICE / smoothed_ground_price.max(1.0)).powf(PRICE_ELASTICITY);
    let total = baseline_pflops * price_factor;

    // No finite orbital price means orbit is not on offer at all.
    let target = if smoothed_ground_price > 0.0 && smoothed_orbital_price.is_finite() {
        let advantage = (smoothed_ground_price - smoothed_orbital_price) / smoothed_ground_price;
        substitution_target(advantage)
    } else {
        0.0
    };
    let shift = (target - prev_orbital_share).clamp(-MAX_SHARE_SHIFT, MAX_SHARE_SHIFT);
    let orbital_share = (prev_orbital_share + shift).clamp(0.0, MAX_ORBITAL_SHARE);

    let orbital_demand_pflops = total * orbital_share;
    DemandResult {
        year,
        baseline_pflops,
        ground_demand_pflops: total - orbital_demand_pflops,
        orbital_share,
        orbital_demand_pflops,
    }
}

/// Resolve ground supply: capped compounding build, backlog, wait, rent.
pub fn calculate_supply(
    year: u32,
    prev_capacity_pflops: f64,
    prev_backlog_pflops: f64,
    ground_demand_pflops: f64,
) -> SupplyResult {
    let build_fraction = BUILD_RATE.min(BUILD_RATE_CAP);
    let build_rate_pflops = prev_capacity_pflops * build_fraction;
    let capacity_pflops = prev_capacity_pflops + build_rate_pflops;

    let unmet = (ground_demand_pflops - capacity_pflops).max(0.0);
    let backlog_pflops = (prev_backlog_pflops + unmet - build_rate_pflops).max(0.0);
    let wait_years = if build_rate_pflops > 0.0 {
        backlog_pflops / build_rate_pflops
    } else if backlog_pflops > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    SupplyResult {
        year,
        capacity_pflops,
        build_rate_pflops,
        backlog_pflops,
        wait_years,
        scarcity_multiplier: scarcity_multiplier(wait_years),
    }
}

/// Resolve the ground price: exponential base decline times scarcity.
pub fn calculate_ground_price(year: u32, scarcity: f64) -> PriceResult {
    let base_price = GROUND_BASE_PRICE * MOORE_DECLINE.powi(year as i32);
    PriceResult {
        year,
        base_price,
        scarcity_multiplier: scarcity,
        price_per_pflop_year: base_price * scarcity,
    }
}

/// Run the full economic trajectory over a fixed year range. One
/// `YearState` is appended per year; no early termination, no skipping.
/// `orbital_prices[year]` is that year's orbital $/PFLOP-year; missing
/// entries read as orbit-unavailable.
pub fn run_trajectory(years: u32, orbital_prices: &[f64], log: &mut RunLog) -> Vec<YearState> {
    let mut trajectory = Vec::with_capacity(years as usize);
    let mut smoothed_ground = GROUND_BASE_PRICE;
    let mut smoothed_orbital = orbital_prices.first().copied().unwrap_or(f64::INFINITY);
    let mut orbital_share = 0.0;
    let mut capacity = BASE_CAPACITY_PFLOPS;
    let mut backlog = 0.0;

    for year in 0..years {
        let orbital_price = orbital_prices
            .get(year as usize)
            .copied()
            .unwrap_or(f64::INFINITY);

        let demand = calculate_demand(year, smoothed_ground, smoothed_orbital, orbital_share);
        let supply = calculate_supply(year, capacity, backlog, demand.ground_demand_pflops);
        let price = calculate_ground_price(year, supply.scarcity_multiplier);

        if supply.scarcity_multiplier >= 1.0 + SCARCITY_K - 1e-12 {
            log.push(RunEvent::ScarcitySaturated {
                year,
                wait_years: supply.wait_years,
            });
            log::debug!("scarcity saturated in year {year}");
        }

        smoothed_ground = PRICE_SMOOTHING_ALPHA * price.price_per_pflop_year
            + (1.0 - PRICE_SMOOTHING_ALPHA) * smoothed_ground;
        if orbital_price.is_finite() {
            // First finite offer seeds the average; blending into an
            // infinite prior would pin it there forever.
            smoothed_orbital = if smoothed_orbital.is_finite() {
                PRICE_SMOOTHING_ALPHA * orbital_price
                    + (1.0 - PRICE_SMOOTHING_ALPHA) * smoothed_orbital
            } else {
                orbital_price
            };
        }

        orbital_share = demand.orbital_share;
        capacity = supply.capacity_pflops;
        backlog = supply.backlog_pflops;

        trajectory.push(YearState {
            year,
            demand,
            supply,
            price,
            orbital_price,
            smoothed_ground_price: smoothed_ground,
            smoothed_orbital_price: smoothed_orbital,
        });
    }
    trajectory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scarcity_zero_at_zero_wait() {
        assert!((scarcity_multiplier(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scarcity_monotone() {
        let waits = [0.0, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 100.0];
        for pair in waits.windows(2) {
            assert!(
                scarcity_multiplier(pair[1]) >= scarcity_multiplier(pair[0]),
                "rent decreased from wait {} to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_scarcity_saturates_at_ten_years() {
        let at_ten = scarcity_multiplier(10.0);
        let at_twenty = scarcity_multiplier(20.0);
        assert!((at_ten - at_twenty).abs() < 1e-12);
        assert!((at_ten - (1.0 + SCARCITY_K)).abs() < 1e-12);
    }

    #[test]
    fn test_scarcity_bounded_even_for_infinite_wait() {
        assert!((scarcity_multiplier(f64::INFINITY) - (1.0 + SCARCITY_K)).abs() < 1e-12);
    }

    #[test]
    fn test_share_shift_capped_at_ten_points() {
        // Enormous price advantage: the target jumps, the share crawls.
        let d1 = calculate_demand(0, 1_000_000.0, 100_000.0, 0.0);
        assert!(d1.orbital_share <= MAX_SHARE_SHIFT + 1e-12);
        let d2 = calculate_demand(1, 1_000_000.0, 100_000.0, d1.orbital_share);
        assert!(d2.orbital_share - d1.orbital_share <= MAX_SHARE_SHIFT + 1e-12);
    }

    #[test]
    fn test_share_can_retreat_but_slowly() {
        // Orbit got expensive: the share falls, at most ten points.
        let d = calculate_demand(3, 1_000_000.0, 5_000_000.0, 0.5);
        assert!(d.orbital_share >= 0.5 - MAX_SHARE_SHIFT - 1e-12);
        assert!(d.orbital_share < 0.5);
    }

    #[test]
    fn test_cheaper_ground_price_raises_demand() {
        let expensive = calculate_demand(5, 2_000_000.0, f64::INFINITY, 0.0);
        let cheap = calculate_demand(5, 500_000.0, f64::INFINITY, 0.0);
        let total_expensive = expensive.ground_demand_pflops + expensive.orbital_demand_pflops;
        let total_cheap = cheap.ground_demand_pflops + cheap.orbital_demand_pflops;
        assert!(total_cheap > total_expensive);
    }

    #[test]
    fn test_supply_build_is_capped() {
        let s = calculate_supply(2, 1000.0, 0.0, 500.0);
        assert!(s.build_rate_pflops <= 1000.0 * BUILD_RATE_CAP + 1e-9);
        assert!(s.capacity_pflops > 1000.0);
    }

    #[test]
    fn test_backlog_accumulates_unmet_demand() {
        let s = calculate_supply(2, 1000.0, 100.0, 5000.0);
        // unmet = 5000 - 1200 = 3800; backlog = 100 + 3800 - 200.
        assert!((s.backlog_pflops - 3700.0).abs() < 1e-9);
        assert!(s.wait_years > 10.0);
        assert!((s.scarcity_multiplier - (1.0 + SCARCITY_K)).abs() < 1e-12);
    }

    #[test]
    fn test_price_declines_without_scarcity() {
        let p0 = calculate_ground_price(0, 1.0);
        let p5 = calculate_ground_price(5, 1.0);
        assert!(p5.price_per_pflop_year < p0.price_per_pflop_year);
    }

    #[test]
    fn test_trajectory_fixed_length_and_ordered() {
        let mut log = RunLog::new();
        let orbital: Vec<f64> = (0..20).map(|y| 2_000_000.0 * 0.8f64.powi(y)).collect();
        let traj = run_trajectory(20, &orbital, &mut log);
        assert_eq!(traj.len(), 20);
        for (i, y) in traj.iter().enumerate() {
            assert_eq!(y.year, i as u32);
        }
    }

    #[test]
    fn test_trajectory_deterministic() {
        let orbital: Vec<f64> = (0..15).map(|y| 1_800_000.0 * 0.82f64.powi(y)).collect();
        let mut log_a = RunLog::new();
        let mut log_b = RunLog::new();
        let a = run_trajectory(15, &orbital, &mut log_a);
        let b = run_trajectory(15, &orbital, &mut log_b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_smoothed_price_stays_between_prev_and_raw() {
        // The smoothed price is a convex combination of the previous
        // smoothed value and this year's raw price — it never overshoots
        // either, which is what breaks the feedback oscillation.
        let mut log = RunLog::new();
        let orbital = vec![f64::INFINITY; 12];
        let traj = run_trajectory(12, &orbital, &mut log);
        for pair in traj.windows(2) {
            let prev_smoothed = pair[0].smoothed_ground_price;
            let raw = pair[1].price.price_per_pflop_year;
            let smoothed = pair[1].smoothed_ground_price;
            let lo = prev_smoothed.min(raw) - 1e-9;
            let hi = prev_smoothed.max(raw) + 1e-9;
            assert!(
                smoothed >= lo && smoothed <= hi,
                "smoothed price {smoothed} overshot [{lo}, {hi}]"
            );
        }
    }

    #[test]
    fn test_no_orbital_prices_means_no_substitution() {
        let mut log = RunLog::new();
        let traj = run_trajectory(10, &[], &mut log);
        for y in &traj {
            assert_eq!(y.demand.orbital_share, 0.0);
        }
    }

    #[test]
    fn test_cheap_orbit_gains_share() {
        let mut log = RunLog::new();
        let orbital: Vec<f64> = (0..15).map(|y| 900_000.0 * 0.75f64.powi(y)).collect();
        let traj = run_trajectory(15, &orbital, &mut log);
        let last = traj.last().unwrap();
        assert!(
            last.demand.orbital_share > 0.3,
            "persistently cheap orbit should take share, got {}",
            last.demand.orbital_share
        );
    }
}

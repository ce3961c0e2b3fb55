//! Carbon intensity model — ground grid vs. orbital embodied emissions.
//!
//! Both sides are expressed as tCO2 per PFLOP-year. Ground follows the
//! grid's slow decarbonization; orbital starts high (launch and
//! manufacturing are amortized over the fleet) and declines with launch
//! reuse and specific-power learning, but never faster than the maximum
//! transition rate.

use serde::{Deserialize, Serialize};

/// Ground carbon intensity in the base year (tCO2 per PFLOP-year).
const GROUND_BASE_TCO2: f64 = 4.0;
/// Annual grid decarbonization factor.
const GROUND_DECLINE: f64 = 0.96;
/// Orbital carbon intensity in the base year (tCO2 per PFLOP-year).
const ORBITAL_BASE_TCO2: f64 = 12.0;
/// Annual orbital decline from launch reuse and lighter panels.
const ORBITAL_DECLINE: f64 = 0.85;
/// Largest allowed year-over-year decline of orbital carbon.
pub const MAX_TRANSITION_RATE: f64 = 0.50;

/// One year of the carbon comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonYear {
    pub year: u32,
    pub ground_tco2_per_pflop_year: f64,
    pub orbital_tco2_per_pflop_year: f64,
    /// True from the first year orbital beats ground onward.
    pub crossover: bool,
}

/// Ground carbon intensity for a calendar year.
pub fn ground_carbon_intensity(year: u32) -> f64 {
    GROUND_BASE_TCO2 * GROUND_DECLINE.powi(year as i32)
}

/// Orbital carbon intensity for a calendar year, clamped so it never
/// falls more than `MAX_TRANSITION_RATE` below the previous year.
pub fn orbital_carbon_intensity(year: u32, prev: Option<f64>) -> f64 {
    let raw = ORBITAL_BASE_TCO2 * ORBITAL_DECLINE.powi(year as i32);
    match prev {
        Some(p) => raw.max(p * (1.0 - MAX_TRANSITION_RATE)),
        None => raw,
    }
}

/// Build the year-indexed carbon comparison. The crossover flag latches:
/// once orbital beats ground it is reported as crossed for every later
/// year.
pub fn carbon_series(years: u32) -> Vec<CarbonYear> {
    let mut series = Vec::with_capacity(years as usize);
    let mut prev_orbital: Option<f64> = None;
    let mut crossed = false;
    for year in 0..years {
        let ground = ground_carbon_intensity(year);
        let orbital = orbital_carbon_intensity(year, prev_orbital);
        if orbital < ground {
            crossed = true;
        }
        series.push(CarbonYear {
            year,
            ground_tco2_per_pflop_year: ground,
            orbital_tco2_per_pflop_year: orbital,
            crossover: crossed,
        });
        prev_orbital = Some(orbital);
    }
    series
}

/// First year orbital carbon beats ground, if it happens in range.
pub fn crossover_year(series: &[CarbonYear]) -> Option<u32> {
    series.iter().find(|y| y.crossover).map(|y| y.year)
}

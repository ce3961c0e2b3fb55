//! Pure simulation core for orbital vs. ground compute economics.
//!
//! This crate contains the whole physics/economics engine as plain
//! functions over plain data — no rendering, no runtime, no I/O, no
//! global state. Everything is deterministic: the same scenario produces
//! the same trajectory, bit for bit. The (separate) harness binary and
//! any UI are consumers of the records produced here.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`carbon`] | Ground vs. orbital carbon intensity, bounded transition, crossover |
//! | [`constants`] | Shared physical constants and unit conversions |
//! | [`costs`] | $/PFLOP-year component models and the fleet capital cost scenario |
//! | [`deployment`] | Per-shell fleet growth with fail-fast transition checks |
//! | [`economy`] | Demand/supply/price year loop with smoothed-price feedback |
//! | [`invariants`] | Integrity test battery over completed trajectories |
//! | [`runlog`] | Caller-owned run event log (no global debug state) |
//! | [`scenario`] | Scenario config, validation, derived sizing, end-to-end driver |
//! | [`survival`] | Hazard-integral fleet survival with mode floors |
//! | [`thermal`] | Stefan-Boltzmann equilibrium stepper and risk policy table |
//! | [`throughput`] | Effective-compute resolution and idle power back-scaling |
//!
//! Two error-handling regimes coexist deliberately: configuration and
//! deployment-transition problems fail fast (`Result` + typed errors),
//! while physical and market conditions (over-temperature, scarcity)
//! degrade gracefully through derating, clamping, and saturating
//! multipliers — a multi-year trajectory never aborts because one year
//! ran hot.

pub mod carbon;
pub mod constants;
pub mod costs;
pub mod deployment;
pub mod economy;
pub mod invariants;
pub mod runlog;
pub mod scenario;
pub mod survival;
pub mod thermal;
pub mod throughput;

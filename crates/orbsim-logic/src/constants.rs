//! Shared physical constants and unit conversions.
//!
//! Domain-specific tuning constants live next to the code that uses them
//! (e.g. the scarcity coefficients in `economy`); only values shared by
//! several modules belong here.

pub mod physics {
    /// Stefan-Boltzmann constant (W/m²·K⁴).
    pub const STEFAN_BOLTZMANN: f64 = 5.670374419e-8;
    /// Effective radiative sink temperature in Earth orbit (K).
    /// Earth IR and albedo raise this well above the 3 K cosmic background.
    pub const SINK_TEMP_K: f64 = 255.0;
    /// Celsius ↔ Kelvin offset.
    pub const KELVIN_OFFSET: f64 = 273.15;
}

pub mod units {
    /// Peak FLOPS sustained per kW of IT power (H100-class payloads).
    pub const FLOPS_PER_KW: f64 = 1.0e15;
    /// Exportable FLOPS supported per Gbps of downlink. Result traffic is
    /// small relative to the compute it represents, hence the large ratio.
    pub const FLOPS_PER_GBPS: f64 = 1.0e15;
    /// FLOPS in one PFLOP.
    pub const FLOPS_PER_PFLOP: f64 = 1.0e15;
    /// Hours in a year (non-leap).
    pub const HOURS_PER_YEAR: f64 = 8760.0;
}

pub mod sim {
    /// Ticks resolved per simulated year when a scenario does not say otherwise.
    pub const DEFAULT_TICKS_PER_YEAR: u32 = 12;
}

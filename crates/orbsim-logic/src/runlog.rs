//! Caller-owned run event log.
//!
//! Drivers record notable runtime decisions (throttling, burnout, forced
//! survival decay, scarcity saturation) into a `RunLog` owned by whoever
//! started the run. There is no process-wide log state; two concurrent
//! runs each write to their own collector.

use serde::{Deserialize, Serialize};

/// A single notable event during a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    /// Heat generation exceeded what the radiator could reject at the
    /// ceiling; compute and heat were throttled by `factor`.
    ThermalThrottle { year: u32, tick: u32, factor: f64 },
    /// Radiator area/emissivity decayed from running above the ceiling.
    Burnout { year: u32, tick: u32 },
    /// Survival was forced below the perfect-fleet threshold because
    /// unrecovered failures existed.
    ForcedSurvivalDecay { year: u32, tick: u32 },
    /// The scarcity multiplier hit its cap this year.
    ScarcitySaturated { year: u32, wait_years: f64 },
    /// The deployment strategy changed between years.
    StrategyChange { year: u32, strategy: String },
}

/// Append-only event collector for one simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunLog {
    pub events: Vec<RunEvent>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RunEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Count events of a given kind, e.g. how many ticks throttled.
    pub fn count_throttles(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RunEvent::ThermalThrottle { .. }))
            .count()
    }

    pub fn count_burnouts(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RunEvent::Burnout { .. }))
            .count()
    }
}

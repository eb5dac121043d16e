//! Observation panel for replacement-decision data.
//!
//! One record per (bus, period). The usage increment is the state change
//! observed between this period and the next; it is undefined on the
//! terminal record of a bus and on records where the engine was replaced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary maintenance decision recorded for an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Decision {
    /// Keep operating (decision = 0).
    Maintain,
    /// Replace and reset the state (decision = 1).
    Replace,
}

impl Decision {
    /// Numeric indicator used in the decision matrix.
    pub fn indicator(self) -> f64 {
        match self {
            Decision::Maintain => 0.0,
            Decision::Replace => 1.0,
        }
    }
}

impl TryFrom<u8> for Decision {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Decision::Maintain),
            1 => Ok(Decision::Replace),
            other => Err(format!("decision must be 0 or 1, got {}", other)),
        }
    }
}

impl From<Decision> for u8 {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Maintain => 0,
            Decision::Replace => 1,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Maintain => write!(f, "maintain"),
            Decision::Replace => write!(f, "replace"),
        }
    }
}

/// A single panel record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Bus identifier.
    pub bus_id: u32,
    /// Period index within the bus's history.
    pub period: u32,
    /// Discretized mileage state at the start of the period.
    pub state: u32,
    /// Decision taken in this period.
    pub decision: Decision,
    /// State increment until the next period, if defined.
    #[serde(default)]
    pub usage: Option<i64>,
}

impl Observation {
    pub fn new(
        bus_id: u32,
        period: u32,
        state: u32,
        decision: Decision,
        usage: Option<i64>,
    ) -> Self {
        Self {
            bus_id,
            period,
            state,
            decision,
            usage,
        }
    }
}

/// Immutable panel of observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Panel {
    observations: Vec<Observation>,
}

impl Panel {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Parse a panel from a JSON array of observation records.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// State column, one entry per observation.
    pub fn states(&self) -> Vec<usize> {
        self.observations.iter().map(|o| o.state as usize).collect()
    }

    /// Decision column, one entry per observation.
    pub fn decisions(&self) -> Vec<Decision> {
        self.observations.iter().map(|o| o.decision).collect()
    }

    /// Usage column; `None` marks an undefined increment.
    pub fn usage(&self) -> Vec<Option<i64>> {
        self.observations.iter().map(|o| o.usage).collect()
    }

    /// Largest recorded state, or None for an empty panel.
    pub fn max_state(&self) -> Option<usize> {
        self.observations.iter().map(|o| o.state as usize).max()
    }

    /// Number of distinct buses in the panel.
    pub fn num_buses(&self) -> usize {
        let mut ids: Vec<u32> = self.observations.iter().map(|o| o.bus_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

impl From<Vec<Observation>> for Panel {
    fn from(observations: Vec<Observation>) -> Self {
        Self::new(observations)
    }
}

//! Typed estimation configuration.
//!
//! ```toml
//! schema_version = "1.0.0"
//! discount_factor = 0.9999
//!
//! [state_space]
//! variant = "scaled"
//! margin = 1.2
//! fixed_states = 90
//!
//! [hessian]
//! relative_step = 1.22e-4
//! allow_forward_fallback = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::ValidationError;

/// Default discount factor for the structural model.
pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.9999;

/// Default headroom multiplier over the largest observed state.
pub const DEFAULT_STATE_MARGIN: f64 = 1.2;

/// Default size of the fixed state space.
pub const DEFAULT_FIXED_STATES: usize = 90;

/// Default relative finite-difference step, roughly `EPSILON^(1/4)`.
pub const DEFAULT_HESSIAN_STEP: f64 = 1.22e-4;

/// Top-level estimation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Schema version (must match `CONFIG_SCHEMA_VERSION`).
    pub schema_version: String,

    /// Discount factor β of the structural model, in (0, 1).
    pub discount_factor: f64,

    /// How the number of states is chosen.
    pub state_space: StateSpaceConfig,

    /// Finite-difference Hessian settings.
    pub hessian: HessianConfig,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            state_space: StateSpaceConfig::default(),
            hessian: HessianConfig::default(),
        }
    }
}

impl EstimationConfig {
    /// Load from a file; `.json` is parsed as JSON, anything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ValidationError> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Parse from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// The state-space rule selected by this config.
    pub fn state_space(&self) -> StateSpace {
        self.state_space.resolve()
    }
}

/// Which state-space rule is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSpaceVariant {
    /// `floor(margin × max observed state)` states.
    #[default]
    Scaled,
    /// A fixed number of states regardless of the data.
    Fixed,
}

/// State-space sizing section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSpaceConfig {
    pub variant: StateSpaceVariant,

    /// Multiplier over the largest observed state (scaled variant).
    pub margin: f64,

    /// Number of states (fixed variant).
    pub fixed_states: usize,
}

impl Default for StateSpaceConfig {
    fn default() -> Self {
        Self {
            variant: StateSpaceVariant::Scaled,
            margin: DEFAULT_STATE_MARGIN,
            fixed_states: DEFAULT_FIXED_STATES,
        }
    }
}

impl StateSpaceConfig {
    pub fn resolve(&self) -> StateSpace {
        match self.variant {
            StateSpaceVariant::Scaled => StateSpace::Scaled {
                margin: self.margin,
            },
            StateSpaceVariant::Fixed => StateSpace::Fixed(self.fixed_states),
        }
    }
}

/// Rule for sizing the state space of the transition matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSpace {
    /// `floor(margin × max_state)` states; the margin leaves room above the
    /// largest observed state for the absorbing boundary.
    Scaled { margin: f64 },
    /// Exactly this many states.
    Fixed(usize),
}

impl Default for StateSpace {
    fn default() -> Self {
        StateSpace::Scaled {
            margin: DEFAULT_STATE_MARGIN,
        }
    }
}

impl StateSpace {
    /// Number of states for a panel whose largest observed state is `max_state`.
    pub fn num_states(&self, max_state: usize) -> usize {
        match *self {
            StateSpace::Scaled { margin } => {
                let scaled = margin * max_state as f64;
                if scaled.is_finite() && scaled > 0.0 {
                    scaled.floor() as usize
                } else {
                    0
                }
            }
            StateSpace::Fixed(n) => n,
        }
    }
}

/// Finite-difference Hessian section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HessianConfig {
    /// Step for coordinate `i` is `relative_step * max(1, |x_i|)`.
    pub relative_step: f64,

    /// Retry with a forward-difference Hessian when the central one is not finite.
    pub allow_forward_fallback: bool,
}

impl Default for HessianConfig {
    fn default() -> Self {
        Self {
            relative_step: DEFAULT_HESSIAN_STEP,
            allow_forward_fallback: true,
        }
    }
}

//! Error types for replacement-model estimation.
//!
//! Every failure carries:
//! - A stable numeric code for machine parsing
//! - A category (domain violation, numerical degeneracy, dependency failure)
//! - A recoverability hint and a remediation string for humans
//!
//! Domain violations fail fast, numerical degeneracies are surfaced rather
//! than masked, and errors raised by external collaborators (the structural
//! likelihood or the differentiation service) are propagated unchanged.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ State Space Too Small
//!   Reason: state space of 3 states cannot hold increments up to 3 (support 4)
//!   Fix: Increase the number of states or the state-space margin.
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for estimation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Inputs outside the model's domain (negative increments, tiny state spaces).
    Domain,
    /// Data does not support estimation as configured (zero bins, singular Hessian).
    Numerical,
    /// External collaborator failed (structural likelihood, differentiation).
    Dependency,
    /// Configuration loading or validation errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Domain => write!(f, "domain"),
            ErrorCategory::Numerical => write!(f, "numerical"),
            ErrorCategory::Dependency => write!(f, "dependency"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for estimation.
#[derive(Error, Debug)]
pub enum Error {
    // Domain violations (10-19)
    #[error("negative usage increment {value} at observation {index}")]
    NegativeIncrement { index: usize, value: i64 },

    #[error("state space of {num_states} states cannot hold increments up to {max_increment} (support {support})", max_increment = .support.saturating_sub(1))]
    StateSpaceTooSmall { num_states: usize, support: usize },

    #[error("observation {index} has state {state}, outside a state space of {num_states} states")]
    StateOutOfRange {
        index: usize,
        state: usize,
        num_states: usize,
    },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no usable usage increments in panel")]
    EmptyPanel,

    #[error("usage increment {value} at observation {index} exceeds the limit of {limit}")]
    IncrementTooLarge { index: usize, value: i64, limit: usize },

    // Numerical degeneracies (20-29)
    #[error("bin {index} has positive count {count} but probability {probability}")]
    DegenerateProbability {
        index: usize,
        count: u64,
        probability: f64,
    },

    #[error("ill-conditioned matrix: {0}")]
    IllConditioned(String),

    #[error("objective is not finite at {0}")]
    NonFiniteObjective(String),

    // Dependency failures (30-39)
    #[error("structural likelihood failed: {0}")]
    Likelihood(String),

    #[error("numerical differentiation failed: {0}")]
    Differentiation(String),

    // Configuration errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Domain violations
    /// - 20-29: Numerical degeneracies
    /// - 30-39: Dependency failures
    /// - 40-49: Configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::NegativeIncrement { .. } => 10,
            Error::StateSpaceTooSmall { .. } => 11,
            Error::StateOutOfRange { .. } => 12,
            Error::DimensionMismatch { .. } => 13,
            Error::InvalidInput(_) => 14,
            Error::EmptyPanel => 15,
            Error::IncrementTooLarge { .. } => 16,
            Error::DegenerateProbability { .. } => 20,
            Error::IllConditioned(_) => 21,
            Error::NonFiniteObjective(_) => 22,
            Error::Likelihood(_) => 30,
            Error::Differentiation(_) => 31,
            Error::Config(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NegativeIncrement { .. }
            | Error::StateSpaceTooSmall { .. }
            | Error::StateOutOfRange { .. }
            | Error::DimensionMismatch { .. }
            | Error::InvalidInput(_)
            | Error::EmptyPanel
            | Error::IncrementTooLarge { .. } => ErrorCategory::Domain,

            Error::DegenerateProbability { .. }
            | Error::IllConditioned(_)
            | Error::NonFiniteObjective(_) => ErrorCategory::Numerical,

            Error::Likelihood(_) | Error::Differentiation(_) => ErrorCategory::Dependency,

            Error::Config(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error may be resolved by changing the inputs.
    ///
    /// Nothing in the estimation core retries; this is a hint for callers.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Bad data stays bad
            Error::NegativeIncrement { .. } => false,
            Error::EmptyPanel => false,
            Error::IncrementTooLarge { .. } => false,

            // Fixable by resizing the state space
            Error::StateSpaceTooSmall { .. } => true,
            Error::StateOutOfRange { .. } => true,

            Error::DimensionMismatch { .. } => false,
            Error::InvalidInput(_) => false,

            Error::DegenerateProbability { .. } => false,
            Error::IllConditioned(_) => true, // different evaluation point
            Error::NonFiniteObjective(_) => true,

            Error::Likelihood(_) => false,
            Error::Differentiation(_) => true,

            Error::Config(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::NegativeIncrement { .. } => {
                "Usage increments must be non-negative. Check the panel's usage column for sign errors."
            }
            Error::StateSpaceTooSmall { .. } => {
                "Increase the number of states or the state-space margin."
            }
            Error::StateOutOfRange { .. } => {
                "Increase the state-space margin so every observed state fits, or use a fixed state space."
            }
            Error::DimensionMismatch { .. } => {
                "Probability and count vectors must have the same length."
            }
            Error::InvalidInput(_) => "Check the arguments passed to the estimation routine.",
            Error::EmptyPanel => {
                "The panel has no observation with a defined usage increment. Supply more data."
            }
            Error::IncrementTooLarge { .. } => {
                "Usage increments are discretized bin counts. Check the usage column for unit or overflow errors."
            }

            Error::DegenerateProbability { .. } => {
                "An observed increment was assigned zero probability. Re-estimate the probabilities from the same counts."
            }
            Error::IllConditioned(_) => {
                "The Hessian is singular or non-finite at this point. Evaluate at the fitted parameters."
            }
            Error::NonFiniteObjective(_) => {
                "The structural likelihood returned NaN or infinity. Check the parameter vector."
            }

            Error::Likelihood(_) => {
                "The structural likelihood evaluator failed. Inspect its error message."
            }
            Error::Differentiation(_) => {
                "Numerical differentiation failed. Try a different evaluation point."
            }

            Error::Config(_) => "Validate the estimation config file and fix the reported field.",

            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .' or restore from backup.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::NegativeIncrement { .. } => "Negative Usage Increment",
            Error::StateSpaceTooSmall { .. } => "State Space Too Small",
            Error::StateOutOfRange { .. } => "State Out Of Range",
            Error::DimensionMismatch { .. } => "Dimension Mismatch",
            Error::InvalidInput(_) => "Invalid Input",
            Error::EmptyPanel => "Empty Panel",
            Error::IncrementTooLarge { .. } => "Usage Increment Too Large",

            Error::DegenerateProbability { .. } => "Degenerate Probability",
            Error::IllConditioned(_) => "Ill-Conditioned Matrix",
            Error::NonFiniteObjective(_) => "Non-Finite Objective",

            Error::Likelihood(_) => "Structural Likelihood Failed",
            Error::Differentiation(_) => "Differentiation Failed",

            Error::Config(_) => "Configuration Error",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (indices, sizes).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::NegativeIncrement { index, value } => {
                context.insert("index".to_string(), serde_json::json!(index));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            Error::StateSpaceTooSmall {
                num_states,
                support,
            } => {
                context.insert("num_states".to_string(), serde_json::json!(num_states));
                context.insert("support".to_string(), serde_json::json!(support));
            }
            Error::StateOutOfRange {
                index,
                state,
                num_states,
            } => {
                context.insert("index".to_string(), serde_json::json!(index));
                context.insert("state".to_string(), serde_json::json!(state));
                context.insert("num_states".to_string(), serde_json::json!(num_states));
            }
            Error::DegenerateProbability { index, count, .. } => {
                context.insert("index".to_string(), serde_json::json!(index));
                context.insert("count".to_string(), serde_json::json!(count));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::estimation::{EstimationConfig, StateSpaceVariant};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for rr_common::Error {
    fn from(err: ValidationError) -> Self {
        rr_common::Error::Config(err.to_string())
    }
}

/// Validate an estimation config semantically.
pub fn validate_config(config: &EstimationConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let beta = config.discount_factor;
    if !beta.is_finite() || beta <= 0.0 || beta >= 1.0 {
        return Err(ValidationError::InvalidValue {
            field: "discount_factor".to_string(),
            message: format!("Must be in (0, 1), got {}", beta),
        });
    }

    let ss = &config.state_space;
    match ss.variant {
        StateSpaceVariant::Scaled => {
            if !ss.margin.is_finite() || ss.margin <= 1.0 {
                return Err(ValidationError::InvalidValue {
                    field: "state_space.margin".to_string(),
                    message: format!(
                        "Must be greater than 1 to leave room above the largest state, got {}",
                        ss.margin
                    ),
                });
            }
        }
        StateSpaceVariant::Fixed => {
            // One transient state plus the absorbing boundary at minimum.
            if ss.fixed_states < 2 {
                return Err(ValidationError::InvalidValue {
                    field: "state_space.fixed_states".to_string(),
                    message: format!("Must be at least 2, got {}", ss.fixed_states),
                });
            }
        }
    }

    let step = config.hessian.relative_step;
    if !step.is_finite() || step <= 0.0 || step > 0.1 {
        return Err(ValidationError::InvalidValue {
            field: "hessian.relative_step".to_string(),
            message: format!("Must be in (0, 0.1], got {}", step),
        });
    }

    Ok(())
}

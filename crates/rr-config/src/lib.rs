//! Estimation configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the estimation config (TOML or JSON)
//! - Config resolution (explicit path → env → XDG → defaults)
//! - Semantic validation

pub mod estimation;
pub mod resolve;
pub mod validate;

pub use estimation::{
    EstimationConfig, HessianConfig, StateSpace, StateSpaceConfig, StateSpaceVariant,
};
pub use resolve::{load_config, resolve_config, ConfigSource, ResolvedConfig};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

//! Shared types and errors for regenerative replacement estimation.
//!
//! This crate provides foundational types used by the other workspace crates:
//! - Observation panel records (bus, period, state, decision, usage)
//! - The unified error type with stable codes and categories

pub mod error;
pub mod panel;

pub use error::{Error, ErrorCategory, Result};
pub use panel::{Decision, Observation, Panel};

//! Replacement-model math kernels.

pub mod math;

pub use math::indicators::{create_decision_matrix, create_state_matrix};
pub use math::multinomial::{cov_multinomial, multinomial_standard_errors};
pub use math::stable::*;
pub use math::transition_matrix::create_transition_matrix;
pub use math::transitions::{
    count_transitions, estimate_from_counts, estimate_transitions, loglike, TransitionEstimate,
    MAX_INCREMENT,
};

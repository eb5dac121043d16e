//! Core math modules.

pub mod indicators;
pub mod multinomial;
pub mod stable;
pub mod transition_matrix;
pub mod transitions;

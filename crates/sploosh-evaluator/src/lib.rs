//! Scoring of guess patterns.
//!
//! - [`objective`] defines what a pattern is optimised for and scores one
//!   pattern against one layout.
//! - [`exact_evaluator`] turns that per-layout score into an exact
//!   expectation over every enumerated layout, used to rank the finalists
//!   of a Monte Carlo search without sampling noise.

pub use self::{exact_evaluator::*, objective::*};

pub mod exact_evaluator;
pub mod objective;

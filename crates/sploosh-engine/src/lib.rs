//! Core model of the squid-hunt guessing game.
//!
//! Three straight targets (lengths 2, 3 and 4 in the standard game) hide on
//! an 8x8 grid without overlapping. This crate provides:
//!
//! - [`Bitboard`] and [`Square`]: the 64-bit grid representation
//! - [`Rules`]: grid width and target lengths, including toy variants
//! - [`LayoutSet`]: every legal layout with its exact placement probability
//! - [`LayoutSampler`]: fresh random layouts without enumeration
//! - [`MaskPattern`] and [`OrderedPattern`]: guess patterns to evaluate and evolve
//!
//! Higher-level crates score patterns (`sploosh-evaluator`), evolve them
//! (`sploosh-training`) and pick adaptive shots (`sploosh-solver`).

pub use self::{core::*, layout_set::*, pattern::*, sampler::*};

mod core;
mod layout_set;
mod pattern;
mod sampler;

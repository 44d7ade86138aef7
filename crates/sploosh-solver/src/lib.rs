//! Adaptive shot selection for a game in progress.
//!
//! Given what has been observed so far ([`PartialSolution`]), the
//! [`StrategySolver`] samples plausible continuations of the game
//! ([`game`]), arranges them into an implicit decision tree and picks the
//! first shot with the highest expected value. [`autoplay()`] drives the
//! solver through a complete game.

pub use self::{autoplay::*, game::*, partial::*, strategy::*};

pub mod autoplay;
pub mod game;
pub mod partial;
pub mod strategy;

//! Plays whole games by asking the solver for every shot.

use rand::Rng;
use serde::Serialize;
use sploosh_engine::{Layout, LayoutSet, ShotOutcome, Square};

use crate::{
    partial::PartialSolution,
    strategy::{SolverError, StrategySolver},
};

/// Shots available in a standard game.
pub const DEFAULT_SHOT_BUDGET: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayedShot {
    pub square: Square,
    pub outcome: ShotOutcome,
    /// Value the solver assigned to this shot when choosing it.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoplayResult {
    pub shots: Vec<PlayedShot>,
    pub targets_sunk: u32,
    /// `true` if every target was sunk within the budget.
    pub won: bool,
}

/// Plays against `layout` until every target is sunk or `budget` shots are
/// spent, re-solving after each shot.
pub fn autoplay<R>(
    solver: &StrategySolver,
    layouts: &LayoutSet,
    layout: &Layout,
    budget: usize,
    rng: &mut R,
) -> Result<AutoplayResult, SolverError>
where
    R: Rng + ?Sized,
{
    let target_count = u32::try_from(layout.targets().len()).unwrap_or(u32::MAX);
    let mut partial = PartialSolution::new();
    let mut shots = vec![];

    while shots.len() < budget && partial.targets_found() < target_count {
        let decision = solver.best_shot(layouts, &partial, rng)?;
        let fired = partial.shot_locations().with(decision.square);
        let outcome = layout.outcome(fired, decision.square);
        partial.record_shot(decision.square, outcome);
        log::info!(
            "shot {}: {} -> {outcome:?} ({} consistent layouts)",
            shots.len() + 1,
            decision.square,
            decision.consistent_layouts
        );
        shots.push(PlayedShot {
            square: decision.square,
            outcome,
            score: decision.score,
        });
    }

    Ok(AutoplayResult {
        shots,
        targets_sunk: partial.targets_found(),
        won: partial.targets_found() == target_count,
    })
}

//! Adaptive next-shot selection.
//!
//! # Algorithm
//!
//! 1. **Filter** the enumerated layouts down to those consistent with the
//!    [`PartialSolution`]. Survivors keep their unnormalised probabilities.
//! 2. **Sample** games: each draws a consistent layout, shoots every hidden
//!    target cell plus random misses in shuffled order, and carries the
//!    layout's probability as its weight.
//! 3. **Sort** games by their shot records, so games sharing a prefix of
//!    shots and outcomes are contiguous.
//! 4. **Score** the implicit game tree in one pass over the sorted games.
//!    A node at slot `d` is a run of games that agree on the first `d`
//!    records and on the square fired at slot `d`. Its games split by the
//!    outcome at slot `d`; for each outcome class the best child (the best
//!    next square) is kept, and the node's value is the sum of the three
//!    class values. A leaf is worth its game's weight.
//! 5. **Select** the first-slot square with the highest value. Ties go to
//!    the square encountered first, i.e. the lowest square index.

use rand::Rng;
use serde::Serialize;
use sploosh_engine::{LayoutSet, ShotOutcome, Square, WeightedLayout};

use crate::{
    game::{Game, GameSampler, GameSampling, MAX_DEPTH},
    partial::PartialSolution,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SolverError {
    #[display("sample count must be at least 1")]
    NoSamples,
    #[display("search depth must be between 1 and 29, got {depth}")]
    InvalidDepth { depth: usize },
    #[display("no layout is consistent with the observed shots")]
    NoConsistentLayouts,
    #[display("every cell has already been shot")]
    NoCellsLeft,
    #[display("cell {square} is marked as hit but was never shot")]
    UnshotHit { square: Square },
    #[display("cannot weight layouts by probability: {_0}")]
    Weights(rand::distr::weighted::Error),
}

/// Search parameters of the strategy solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    /// Number of simulated shots per game (tree depth).
    pub depth: usize,
    /// Number of simulated games per decision.
    pub samples: usize,
    pub sampling: GameSampling,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            depth: 18,
            samples: 100_000,
            sampling: GameSampling::LayoutIndex,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.samples == 0 {
            return Err(SolverError::NoSamples);
        }
        if !(1..=MAX_DEPTH).contains(&self.depth) {
            return Err(SolverError::InvalidDepth { depth: self.depth });
        }
        Ok(())
    }
}

/// Estimated value of firing at one square first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShotScore {
    pub square: Square,
    pub score: f64,
}

/// The solver's choice together with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub square: Square,
    pub score: f64,
    /// Value of every first square that appeared in a sampled game, in
    /// square order.
    pub candidates: Vec<ShotScore>,
    pub consistent_layouts: usize,
    pub games: usize,
    /// Tree depth actually searched.
    pub depth: usize,
}

/// Picks the next shot for a partially played game.
#[derive(Debug, Clone, Copy)]
pub struct StrategySolver {
    config: SolverConfig,
}

impl StrategySolver {
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Chooses the best next shot given what `partial` has observed.
    pub fn best_shot<R>(
        &self,
        layouts: &LayoutSet,
        partial: &PartialSolution,
        rng: &mut R,
    ) -> Result<Decision, SolverError>
    where
        R: Rng + ?Sized,
    {
        let cells = layouts.rules().cells();
        let unshot = (cells & !partial.shot_locations()).count() as usize;
        if unshot == 0 {
            return Err(SolverError::NoCellsLeft);
        }
        let depth = self.config.depth.min(unshot);

        let consistent = layouts
            .iter()
            .filter(|w| partial.is_consistent(w.layout()))
            .collect::<Vec<&WeightedLayout>>();
        log::debug!(
            "{} of {} layouts consistent with {} shots",
            consistent.len(),
            layouts.len(),
            partial.shot_locations().count()
        );

        let sampler = GameSampler::new(&consistent, *partial, cells, depth, self.config.sampling)?;
        let mut games = (0..self.config.samples)
            .map(|_| sampler.sample(rng))
            .collect::<Vec<_>>();
        games.sort();

        let mut scorer = TreeScorer::new(&games, depth);
        let candidates = scorer.score_first_shots();
        debug_assert_eq!(scorer.leaves_visited, games.len());

        let mut best: Option<ShotScore> = None;
        for candidate in &candidates {
            if best.is_none_or(|b| candidate.score > b.score) {
                best = Some(*candidate);
            }
        }
        let best = best.ok_or(SolverError::NoSamples)?;
        log::debug!("best shot {} with score {:e}", best.square, best.score);

        Ok(Decision {
            square: best.square,
            score: best.score,
            candidates,
            consistent_layouts: consistent.len(),
            games: games.len(),
            depth,
        })
    }
}

/// Best value found so far for each outcome class of one slot.
#[derive(Debug, Default, Clone, Copy)]
struct OutcomeBest {
    miss: f64,
    hit: f64,
    sink: f64,
}

impl OutcomeBest {
    fn update(&mut self, outcome: ShotOutcome, score: f64) {
        let slot = match outcome {
            ShotOutcome::Miss => &mut self.miss,
            ShotOutcome::Hit => &mut self.hit,
            ShotOutcome::Sink => &mut self.sink,
        };
        *slot = slot.max(score);
    }

    fn total(self) -> f64 {
        self.miss + self.hit + self.sink
    }
}

/// Single-pass scorer over games sorted by their shot records.
#[derive(Debug)]
pub(crate) struct TreeScorer<'a> {
    games: &'a [Game],
    depth: usize,
    cursor: usize,
    pub(crate) leaves_visited: usize,
}

impl<'a> TreeScorer<'a> {
    pub(crate) fn new(games: &'a [Game], depth: usize) -> Self {
        debug_assert!(games.is_sorted());
        debug_assert!(games.iter().all(|g| g.shots().len() == depth));
        Self {
            games,
            depth,
            cursor: 0,
            leaves_visited: 0,
        }
    }

    /// Scores every first-slot square, consuming all games.
    pub(crate) fn score_first_shots(&mut self) -> Vec<ShotScore> {
        let games = self.games;
        let mut scores = vec![];
        while let Some(game) = games.get(self.cursor) {
            let square = game.shots()[0].square;
            let score = self.score_node(0);
            scores.push(ShotScore { square, score });
        }
        scores
    }

    /// Scores the node starting at the cursor and advances past it.
    fn score_node(&mut self, level: usize) -> f64 {
        if level == self.depth {
            let weight = self.games[self.cursor].weight();
            self.cursor += 1;
            self.leaves_visited += 1;
            return weight;
        }

        let games = self.games;
        let start = &games[self.cursor];
        let mut best = OutcomeBest::default();
        loop {
            let outcome = games[self.cursor].shots()[level].outcome;
            let score = self.score_node(level + 1);
            best.update(outcome, score);

            let Some(next) = games.get(self.cursor) else {
                break;
            };
            let same_prefix = next.shots()[..level] == start.shots()[..level];
            let same_square = next.shots()[level].square == start.shots()[level].square;
            if !(same_prefix && same_square) {
                break;
            }
        }
        best.total()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use sploosh_engine::{Bitboard, Rules};

    use super::*;
    use crate::game::ShotRecord;

    static STANDARD: LazyLock<LayoutSet> =
        LazyLock::new(|| LayoutSet::enumerate(&Rules::standard()));

    fn sq(x: u8, y: u8) -> Square {
        Square::new(x, y).unwrap()
    }

    fn record(square: Square, outcome: ShotOutcome) -> ShotRecord {
        ShotRecord { square, outcome }
    }

    #[test]
    fn test_config_validation() {
        assert!(SolverConfig::default().validate().is_ok());
        let config = |depth, samples| SolverConfig {
            depth,
            samples,
            sampling: GameSampling::LayoutIndex,
        };
        assert!(matches!(
            StrategySolver::new(config(18, 0)),
            Err(SolverError::NoSamples)
        ));
        assert!(matches!(
            StrategySolver::new(config(0, 10)),
            Err(SolverError::InvalidDepth { depth: 0 })
        ));
        assert!(matches!(
            StrategySolver::new(config(30, 10)),
            Err(SolverError::InvalidDepth { depth: 30 })
        ));
        assert!(StrategySolver::new(config(29, 1)).is_ok());
    }

    #[test]
    fn test_tree_scorer_hand_built() {
        let (a, b, c) = (sq(0, 0), sq(1, 0), sq(2, 0));
        let mut games = vec![
            // first shot a: a miss branch with two continuations, and a hit branch
            Game::new(&[record(a, ShotOutcome::Miss), record(b, ShotOutcome::Miss)], 0.1),
            Game::new(&[record(a, ShotOutcome::Miss), record(c, ShotOutcome::Hit)], 0.3),
            Game::new(&[record(a, ShotOutcome::Miss), record(c, ShotOutcome::Miss)], 0.2),
            Game::new(&[record(a, ShotOutcome::Hit), record(b, ShotOutcome::Sink)], 0.05),
            // first shot b: a single game
            Game::new(&[record(b, ShotOutcome::Miss), record(a, ShotOutcome::Miss)], 0.4),
        ];
        games.sort();

        let mut scorer = TreeScorer::new(&games, 2);
        let scores = scorer.score_first_shots();
        assert_eq!(scorer.leaves_visited, 5);
        assert_eq!(scores.len(), 2);

        // a: miss branch -> max(next b: 0.1, next c: 0.3 + 0.2) = 0.5; hit branch -> 0.05
        assert_eq!(scores[0].square, a);
        assert!((scores[0].score - 0.55).abs() < 1e-12);
        assert_eq!(scores[1].square, b);
        assert!((scores[1].score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_every_game_visited_once() {
        let solver_depths = [1, 3, 9, 18];
        let partial = PartialSolution::new();
        let consistent = STANDARD.iter().collect::<Vec<_>>();
        let mut rng = Pcg32::seed_from_u64(31);
        for depth in solver_depths {
            let sampler = GameSampler::new(
                &consistent,
                partial,
                Bitboard::FULL,
                depth,
                GameSampling::LayoutIndex,
            )
            .unwrap();
            let mut games = (0..2000).map(|_| sampler.sample(&mut rng)).collect::<Vec<_>>();
            games.sort();
            let mut scorer = TreeScorer::new(&games, depth);
            let scores = scorer.score_first_shots();
            assert_eq!(scorer.leaves_visited, games.len(), "depth {depth}");
            let firsts = scores.iter().map(|s| s.square).collect::<Vec<_>>();
            assert!(firsts.is_sorted(), "first squares must be distinct and ordered");
            firsts.windows(2).for_each(|w| assert_ne!(w[0], w[1]));
        }
    }

    #[test]
    fn test_single_shot_prefers_central_cells() {
        let solver = StrategySolver::new(SolverConfig {
            depth: 1,
            samples: 300,
            sampling: GameSampling::LayoutIndex,
        })
        .unwrap();
        let argmax = STANDARD.argmax_cells();
        assert_eq!(argmax.count(), 4);

        let mut argmax_hits = 0;
        for seed in 0..100 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let decision = solver.best_shot(&STANDARD, &PartialSolution::new(), &mut rng).unwrap();
            assert_eq!(decision.depth, 1);
            assert_eq!(decision.games, 300);
            if argmax.contains(decision.square) {
                argmax_hits += 1;
            }
        }
        // chance level is 4 of 64 cells, about 6 in 100
        assert!(argmax_hits >= 7, "argmax chosen {argmax_hits} times out of 100");
    }

    #[test]
    fn test_best_shot_after_observations() {
        let solver = StrategySolver::new(SolverConfig {
            depth: 4,
            samples: 2000,
            sampling: GameSampling::LayoutProbability,
        })
        .unwrap();
        let mut partial = PartialSolution::new();
        partial.record_shot(sq(3, 3), ShotOutcome::Hit);
        let mut rng = Pcg32::seed_from_u64(5);
        let decision = solver.best_shot(&STANDARD, &partial, &mut rng).unwrap();
        assert!(!partial.shot_locations().contains(decision.square));
        assert!(decision.consistent_layouts < STANDARD.len());
        assert!(decision.score > 0.0);
        assert!(
            decision
                .candidates
                .iter()
                .all(|c| c.score <= decision.score)
        );
    }

    #[test]
    fn test_depth_clamped_to_unshot_cells() {
        let rules = Rules::new(2, &[2]).unwrap();
        let layouts = LayoutSet::enumerate(&rules);
        let solver = StrategySolver::new(SolverConfig {
            depth: 18,
            samples: 50,
            sampling: GameSampling::LayoutIndex,
        })
        .unwrap();
        let mut partial = PartialSolution::new();
        partial.record_shot(sq(0, 0), ShotOutcome::Miss);
        let mut rng = Pcg32::seed_from_u64(2);
        let decision = solver.best_shot(&layouts, &partial, &mut rng).unwrap();
        assert_eq!(decision.depth, 3);
        assert!(rules.cells().contains(decision.square));
        assert_ne!(decision.square, sq(0, 0));
        // only (1,0)-(1,1) and (0,1)-(1,1) remain; both cover (1,1)
        assert_eq!(decision.consistent_layouts, 2);
    }

    #[test]
    fn test_inconsistent_partial_is_an_error() {
        let solver = StrategySolver::new(SolverConfig {
            depth: 2,
            samples: 10,
            sampling: GameSampling::LayoutIndex,
        })
        .unwrap();
        let mut partial = PartialSolution::new();
        // four sunk targets can never happen
        for x in 0..4 {
            partial.record_shot(sq(x, 0), ShotOutcome::Sink);
        }
        let mut rng = Pcg32::seed_from_u64(0);
        assert!(matches!(
            solver.best_shot(&STANDARD, &partial, &mut rng),
            Err(SolverError::NoConsistentLayouts)
        ));

        let full = PartialSolution::from_parts(Bitboard::FULL, Bitboard::EMPTY, 0).unwrap();
        assert!(matches!(
            solver.best_shot(&STANDARD, &full, &mut rng),
            Err(SolverError::NoCellsLeft)
        ));
    }
}

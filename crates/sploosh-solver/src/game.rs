//! Simulated games used to estimate the value of a first shot.
//!
//! A game is one possible continuation of the real game: a layout consistent
//! with everything observed so far, and a sequence of shots that uncovers
//! every still-hidden target cell (padded with misses) in random order.

use std::cmp::Ordering;

use arrayvec::ArrayVec;
use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
    seq::SliceRandom as _,
};
use serde::Serialize;
use sploosh_engine::{Bitboard, ShotOutcome, Square, WeightedLayout};

use crate::{partial::PartialSolution, strategy::SolverError};

/// Largest number of shots a simulated game can hold.
pub const MAX_DEPTH: usize = 29;

/// One simulated shot and what it revealed.
///
/// Ordered by square, then outcome (`Miss < Hit < Sink`), so sorting games
/// groups them by shared shot prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ShotRecord {
    pub square: Square,
    pub outcome: ShotOutcome,
}

/// A simulated continuation of the real game, weighted by the exact
/// probability of the layout it was generated from.
#[derive(Debug, Clone)]
pub struct Game {
    shots: ArrayVec<ShotRecord, MAX_DEPTH>,
    weight: f64,
}

impl Game {
    #[must_use]
    pub fn new(shots: &[ShotRecord], weight: f64) -> Self {
        Self {
            shots: shots.iter().copied().collect(),
            weight,
        }
    }

    #[must_use]
    pub fn shots(&self) -> &[ShotRecord] {
        &self.shots
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl PartialEq for Game {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Game {}

impl PartialOrd for Game {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Game {
    fn cmp(&self, other: &Self) -> Ordering {
        self.shots
            .as_slice()
            .cmp(other.shots.as_slice())
            .then_with(|| self.weight.total_cmp(&other.weight))
    }
}

/// How the layout behind each simulated game is chosen.
///
/// Parsed case-insensitively from the variant name, e.g. `layoutprobability`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::FromStr, derive_more::IsVariant,
)]
pub enum GameSampling {
    /// Uniformly over the consistent layouts, regardless of probability.
    ///
    /// Games still carry their layout's probability as weight, so the
    /// scorer computes a probability-weighted value either way.
    #[default]
    LayoutIndex,
    /// Proportionally to each consistent layout's probability.
    LayoutProbability,
}

/// Draws simulated games from a filtered set of layouts.
#[derive(Debug)]
pub(crate) struct GameSampler<'a> {
    layouts: &'a [&'a WeightedLayout],
    by_probability: Option<WeightedIndex<f64>>,
    partial: PartialSolution,
    cells: Bitboard,
    depth: usize,
}

impl<'a> GameSampler<'a> {
    pub(crate) fn new(
        layouts: &'a [&'a WeightedLayout],
        partial: PartialSolution,
        cells: Bitboard,
        depth: usize,
        sampling: GameSampling,
    ) -> Result<Self, SolverError> {
        if layouts.is_empty() {
            return Err(SolverError::NoConsistentLayouts);
        }
        let by_probability = match sampling {
            GameSampling::LayoutIndex => None,
            GameSampling::LayoutProbability => Some(
                WeightedIndex::new(layouts.iter().map(|w| w.probability()))
                    .map_err(SolverError::Weights)?,
            ),
        };
        Ok(Self {
            layouts,
            by_probability,
            partial,
            cells,
            depth,
        })
    }

    pub(crate) fn sample<R>(&self, rng: &mut R) -> Game
    where
        R: Rng + ?Sized,
    {
        let index = match &self.by_probability {
            Some(weights) => weights.sample(rng),
            None => rng.random_range(0..self.layouts.len()),
        };
        let weighted = self.layouts[index];
        let layout = weighted.layout();
        let shot = self.partial.shot_locations();

        // forced hits first, then misses drawn without replacement
        let mut squares = (layout.combined() & !self.partial.revealed_target_cells())
            .squares()
            .collect::<ArrayVec<Square, { sploosh_engine::CELL_COUNT as usize }>>();
        if squares.len() > self.depth {
            squares.shuffle(rng);
            squares.truncate(self.depth);
        } else {
            let mut free = self.cells & !(layout.combined() | shot);
            while squares.len() < self.depth {
                let square = free
                    .choose(rng)
                    .expect("depth never exceeds the unshot cells");
                free = free.without(square);
                squares.push(square);
            }
            squares.shuffle(rng);
        }

        let mut shots = shot;
        let records = squares
            .iter()
            .map(|&square| {
                shots = shots.with(square);
                ShotRecord {
                    square,
                    outcome: layout.outcome(shots, square),
                }
            })
            .collect();
        Game {
            shots: records,
            weight: weighted.probability(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use sploosh_engine::{Layout, LayoutSet, Rules};

    use super::*;

    static STANDARD: LazyLock<LayoutSet> =
        LazyLock::new(|| LayoutSet::enumerate(&Rules::standard()));

    fn sq(x: u8, y: u8) -> Square {
        Square::new(x, y).unwrap()
    }

    fn consistent(partial: &PartialSolution) -> Vec<&'static WeightedLayout> {
        STANDARD
            .iter()
            .filter(|w| partial.is_consistent(w.layout()))
            .collect()
    }

    fn check_game(
        game: &Game,
        layouts: &[&WeightedLayout],
        partial: &PartialSolution,
        depth: usize,
    ) -> Layout {
        assert_eq!(game.shots().len(), depth);
        let squares = game.shots().iter().map(|r| r.square).collect::<Bitboard>();
        assert_eq!(squares.count() as usize, depth, "shots must be distinct");
        assert!(squares.is_disjoint(partial.shot_locations()));

        let layout = layouts
            .iter()
            .find(|w| (w.probability() - game.weight()).abs() < f64::EPSILON && {
                let mut shots = partial.shot_locations();
                game.shots().iter().all(|r| {
                    shots = shots.with(r.square);
                    w.layout().outcome(shots, r.square) == r.outcome
                })
            })
            .expect("game must come from some layout");
        layout.layout().clone()
    }

    #[test]
    fn test_games_cover_hidden_cells() {
        let partial = PartialSolution::new();
        let layouts = consistent(&partial);
        let sampler =
            GameSampler::new(&layouts, partial, Bitboard::FULL, 18, GameSampling::LayoutIndex)
                .unwrap();
        let mut rng = Pcg32::seed_from_u64(8);
        for _ in 0..20 {
            let game = sampler.sample(&mut rng);
            let squares = game.shots().iter().map(|r| r.square).collect::<Bitboard>();
            let layout = check_game(&game, &layouts, &partial, 18);
            // 18 shots always uncover all 9 target cells and sink all three targets
            assert!(layout.combined().is_subset(squares));
            let sinks = game.shots().iter().filter(|r| r.outcome.is_sink()).count();
            assert_eq!(sinks, 3);
            let hits = game.shots().iter().filter(|r| r.outcome.is_any_hit()).count();
            assert_eq!(hits, 9);
        }
    }

    #[test]
    fn test_short_games_take_random_hidden_subset() {
        let partial = PartialSolution::new();
        let layouts = consistent(&partial);
        let sampler =
            GameSampler::new(&layouts, partial, Bitboard::FULL, 4, GameSampling::LayoutProbability)
                .unwrap();
        let mut rng = Pcg32::seed_from_u64(13);
        for _ in 0..20 {
            let game = sampler.sample(&mut rng);
            let layout = check_game(&game, &layouts, &partial, 4);
            assert!(game.shots().iter().all(|r| layout.combined().contains(r.square)));
        }
    }

    #[test]
    fn test_games_respect_partial_solution() {
        let mut partial = PartialSolution::new();
        partial.record_shot(sq(3, 3), ShotOutcome::Hit);
        partial.record_shot(sq(0, 0), ShotOutcome::Miss);
        let layouts = consistent(&partial);
        let sampler =
            GameSampler::new(&layouts, partial, Bitboard::FULL, 10, GameSampling::LayoutIndex)
                .unwrap();
        let mut rng = Pcg32::seed_from_u64(21);
        for _ in 0..20 {
            let game = sampler.sample(&mut rng);
            let layout = check_game(&game, &layouts, &partial, 10);
            assert!(layout.combined().contains(sq(3, 3)));
            assert!(!layout.combined().contains(sq(0, 0)));
        }
    }

    #[test]
    fn test_empty_layouts_rejected() {
        let result = GameSampler::new(
            &[],
            PartialSolution::new(),
            Bitboard::FULL,
            1,
            GameSampling::LayoutIndex,
        );
        assert!(matches!(result, Err(SolverError::NoConsistentLayouts)));
    }

    #[test]
    fn test_game_order() {
        let miss = ShotRecord {
            square: sq(1, 0),
            outcome: ShotOutcome::Miss,
        };
        let hit = ShotRecord {
            outcome: ShotOutcome::Hit,
            ..miss
        };
        let later = ShotRecord {
            square: sq(2, 0),
            outcome: ShotOutcome::Miss,
        };
        let mut games = vec![
            Game::new(&[later, miss], 0.1),
            Game::new(&[hit, miss], 0.1),
            Game::new(&[miss, later], 0.3),
            Game::new(&[miss, later], 0.2),
        ];
        games.sort();
        let firsts = games.iter().map(|g| g.shots()[0]).collect::<Vec<_>>();
        assert_eq!(firsts, [miss, miss, hit, later]);
        assert!(games[0].weight() < games[1].weight());
    }

    #[test]
    fn test_parse_sampling() {
        assert_eq!(
            "layoutindex".parse::<GameSampling>().unwrap(),
            GameSampling::LayoutIndex
        );
        assert_eq!(
            "LayoutProbability".parse::<GameSampling>().unwrap(),
            GameSampling::LayoutProbability
        );
        assert!("weighted".parse::<GameSampling>().is_err());
    }
}

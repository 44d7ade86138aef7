//! Evolutionary search over guess patterns.
//!
//! Each round runs the same cycle:
//!
//! 1. **Reset** every member's fitness to zero
//! 2. **Top up** the population with fresh random patterns
//! 3. **Evaluate** with Monte Carlo trials: each trial samples one layout and
//!    adds the objective's score to every member's fitness
//! 4. **Sort** members by fitness, best first
//! 5. **Report** the best pattern and the top and bottom hit rates
//! 6. **Truncate** to the best half
//! 7. **Regrow** by appending one mutated child of each member of the best
//!    quarter
//!
//! After regrowth the population holds three quarters of its configured
//! size; the next round's top-up fills the rest with random patterns, which
//! keeps fresh material flowing in. The last round stops after step 5, so
//! every member of the final population has been scored.
//!
//! Fitness is an integer count of successful trials (or, for
//! [`Objective::MaxHits`], of covered cells). Trials are independent, so
//! the fitness of a round is a plain sum of per-trial contributions.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use sploosh_engine::{MaskPattern, Rules};
//! use sploosh_evaluator::Objective;
//! use sploosh_training::genetic::{Evolution, EvolutionConfig};
//!
//! let config = EvolutionConfig {
//!     pattern_size: 8,
//!     population_size: 64,
//!     trials_per_round: 128,
//!     rounds: 3,
//!     objective: Objective::AtLeast1,
//! };
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
//! let evolution = Evolution::<MaskPattern>::new(&Rules::standard(), config).unwrap();
//! let population = evolution.run(&mut rng, |_round, _report| {});
//! assert_eq!(population.individuals().len(), 64);
//! ```

use std::{collections::HashSet, marker::PhantomData};

use rand::{Rng, distr::Distribution as _};
use sploosh_engine::{Layout, LayoutSampler, Pattern, PatternError, PatternShape, Rules};
use sploosh_evaluator::Objective;

use crate::stats::FitnessStats;

/// Number of best and worst hit rates included in a round report.
pub const REPORT_WIDTH: usize = 10;

/// A pattern and the fitness it accumulated in the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual<P> {
    pattern: P,
    fitness: u64,
}

impl<P> Individual<P>
where
    P: Pattern,
{
    pub fn random<R>(shape: &PatternShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(P::random(shape, rng))
    }

    #[must_use]
    pub fn new(pattern: P) -> Self {
        Self {
            pattern,
            fitness: 0,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &P {
        &self.pattern
    }

    #[must_use]
    pub fn fitness(&self) -> u64 {
        self.fitness
    }

    /// Fitness as a percentage of `trials`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self, trials: u32) -> f64 {
        100.0 * self.fitness as f64 / f64::from(trials)
    }
}

/// Per-round summary handed to the reporter.
#[derive(Debug, Clone)]
pub struct RoundReport<P> {
    pub best: P,
    /// Hit rates of the best members, best first.
    pub top: Vec<f64>,
    /// Hit rates of the worst members, ending with the very worst.
    pub bottom: Vec<f64>,
    pub stats: FitnessStats,
}

/// A collection of patterns scored together.
#[derive(Debug, Clone)]
pub struct Population<P> {
    shape: PatternShape,
    individuals: Vec<Individual<P>>,
}

impl<P> Population<P>
where
    P: Pattern,
{
    #[must_use]
    pub fn new(shape: PatternShape) -> Self {
        Self {
            shape,
            individuals: vec![],
        }
    }

    #[must_use]
    pub fn random<R>(shape: PatternShape, count: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut population = Self::new(shape);
        population.top_up(count, rng);
        population
    }

    #[must_use]
    pub fn shape(&self) -> &PatternShape {
        &self.shape
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual<P>] {
        &self.individuals
    }

    pub fn reset_fitness(&mut self) {
        for ind in &mut self.individuals {
            ind.fitness = 0;
        }
    }

    /// Appends random patterns until the population holds `size` members.
    pub fn top_up<R>(&mut self, size: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        while self.individuals.len() < size {
            self.individuals.push(Individual::random(&self.shape, rng));
        }
    }

    /// Adds the score of one trial layout to every member.
    pub fn accumulate_trial(&mut self, layout: &Layout, objective: Objective) {
        for ind in &mut self.individuals {
            ind.fitness += u64::from(objective.score(ind.pattern.mask(), layout));
        }
    }

    /// Runs `trials` Monte Carlo trials and sorts members by fitness, best
    /// first.
    ///
    /// Members with equal fitness keep their relative order.
    pub fn evaluate_fitness<R>(
        &mut self,
        sampler: &LayoutSampler,
        trials: u32,
        objective: Objective,
        rng: &mut R,
    ) where
        R: Rng + ?Sized,
    {
        for _ in 0..trials {
            let layout = sampler.sample(rng);
            self.accumulate_trial(&layout, objective);
        }

        // sort by fitness descending
        self.individuals.sort_by(|a, b| b.fitness.cmp(&a.fitness));
    }

    /// Computes statistics of the members' hit rates.
    #[must_use]
    pub fn compute_fitness_stats(&self, trials: u32) -> Option<FitnessStats> {
        FitnessStats::new(self.individuals.iter().map(|ind| ind.hit_rate(trials)))
    }

    /// Summarises a sorted population; `None` when it is empty.
    #[must_use]
    pub fn round_report(&self, trials: u32) -> Option<RoundReport<P>> {
        let best = self.individuals.first()?.pattern.clone();
        let width = REPORT_WIDTH.min(self.individuals.len());
        let rates = |inds: &[Individual<P>]| {
            inds.iter()
                .map(|ind| ind.hit_rate(trials))
                .collect::<Vec<_>>()
        };
        Some(RoundReport {
            best,
            top: rates(&self.individuals[..width]),
            bottom: rates(&self.individuals[self.individuals.len() - width..]),
            stats: self.compute_fitness_stats(trials)?,
        })
    }

    /// Returns up to `count` distinct patterns, best first.
    ///
    /// Identical patterns collapse into their highest-ranked copy.
    #[must_use]
    pub fn finalists(&self, count: usize) -> Vec<P> {
        let mut seen = HashSet::new();
        self.individuals
            .iter()
            .map(|ind| &ind.pattern)
            .filter(|pattern| seen.insert(*pattern))
            .take(count)
            .cloned()
            .collect()
    }
}

/// Truncation selection with mutation of the best members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationEvolver {
    /// Number of best members kept unchanged.
    pub survivor_count: usize,
    /// Number of best members that each get one mutated child.
    pub parent_count: usize,
}

impl PopulationEvolver {
    /// Keeps the best half and mutates the best quarter.
    #[must_use]
    pub const fn halving(population_size: usize) -> Self {
        Self {
            survivor_count: population_size / 2,
            parent_count: population_size / 4,
        }
    }

    /// Creates the next generation from a population sorted best first.
    #[must_use]
    pub fn evolve<P, R>(&self, population: &Population<P>, rng: &mut R) -> Population<P>
    where
        P: Pattern,
        R: Rng + ?Sized,
    {
        debug_assert!(
            population
                .individuals
                .is_sorted_by(|a, b| a.fitness >= b.fitness)
        );
        debug_assert!(self.parent_count <= self.survivor_count);

        let survivor_count = self.survivor_count.min(population.individuals.len());
        let survivors = &population.individuals[..survivor_count];
        let parents = &survivors[..self.parent_count.min(survivors.len())];

        let mut next_individuals = survivors.to_vec();
        next_individuals.extend(
            parents
                .iter()
                .map(|ind| Individual::new(ind.pattern.mutated(&population.shape, rng))),
        );

        Population {
            shape: population.shape,
            individuals: next_individuals,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("invalid pattern size: {_0}")]
    Pattern(PatternError),
    #[display("population size must be even and at least 4, got {size}")]
    InvalidPopulation { size: usize },
    #[display("at least one trial per round is required")]
    NoTrials,
    #[display("at least one round is required")]
    NoRounds,
}

/// Parameters of an evolutionary run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionConfig {
    pub pattern_size: u32,
    pub population_size: usize,
    pub trials_per_round: u32,
    pub rounds: usize,
    pub objective: Objective,
}

impl EvolutionConfig {
    /// Checks the configuration against `rules` and returns the pattern shape.
    pub fn validate(&self, rules: &Rules) -> Result<PatternShape, ConfigError> {
        let shape =
            PatternShape::for_rules(rules, self.pattern_size).map_err(ConfigError::Pattern)?;
        if self.population_size < 4 || self.population_size % 2 != 0 {
            return Err(ConfigError::InvalidPopulation {
                size: self.population_size,
            });
        }
        if self.trials_per_round == 0 {
            return Err(ConfigError::NoTrials);
        }
        if self.rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        Ok(shape)
    }
}

/// A validated evolutionary run over patterns of type `P`.
#[derive(Debug, Clone)]
pub struct Evolution<P> {
    config: EvolutionConfig,
    shape: PatternShape,
    sampler: LayoutSampler,
    evolver: PopulationEvolver,
    _pattern: PhantomData<P>,
}

impl<P> Evolution<P>
where
    P: Pattern,
{
    pub fn new(rules: &Rules, config: EvolutionConfig) -> Result<Self, ConfigError> {
        let shape = config.validate(rules)?;
        Ok(Self {
            config,
            shape,
            sampler: LayoutSampler::new(rules),
            evolver: PopulationEvolver::halving(config.population_size),
            _pattern: PhantomData,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Runs every round and returns the final population, sorted best first.
    ///
    /// `on_round` receives the zero-based round number and its report.
    pub fn run<R, F>(&self, rng: &mut R, mut on_round: F) -> Population<P>
    where
        R: Rng + ?Sized,
        F: FnMut(usize, &RoundReport<P>),
    {
        let EvolutionConfig {
            population_size,
            trials_per_round,
            rounds,
            objective,
            ..
        } = self.config;

        let mut population = Population::new(self.shape);
        for round in 0..rounds {
            population.reset_fitness();
            population.top_up(population_size, rng);
            population.evaluate_fitness(&self.sampler, trials_per_round, objective, rng);

            if let Some(report) = population.round_report(trials_per_round) {
                log::debug!(
                    "round {round}: best {:.3}%, mean {:.3}%",
                    report.stats.max,
                    report.stats.mean
                );
                on_round(round, &report);
            }

            if round + 1 < rounds {
                population = self.evolver.evolve(&population, rng);
            }
        }
        population
    }
}

//! Noise-free scoring against the full layout set.
//!
//! Monte Carlo fitness ranks candidates cheaply but noisily. The exact
//! evaluator re-scores a short list of finalists as
//!
//! ```text
//! score(p) = sum over layouts L of objective(p, L) * P(L)
//! ```
//!
//! which for 0/1 objectives is the exact probability that the pattern
//! achieves the objective.

use std::collections::HashSet;

use sploosh_engine::{LayoutSet, Pattern};

use crate::objective::Objective;

/// A pattern with its exact expected score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPattern<P> {
    pub pattern: P,
    pub score: f64,
}

/// Scores patterns exactly over every enumerated layout.
#[derive(Debug, Clone, Copy)]
pub struct ExactEvaluator<'a> {
    layouts: &'a LayoutSet,
    objective: Objective,
}

impl<'a> ExactEvaluator<'a> {
    #[must_use]
    pub fn new(layouts: &'a LayoutSet, objective: Objective) -> Self {
        Self { layouts, objective }
    }

    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Probability-weighted objective score of `pattern`.
    #[must_use]
    pub fn score<P>(&self, pattern: &P) -> f64
    where
        P: Pattern,
    {
        let mask = pattern.mask();
        self.layouts
            .iter()
            .map(|weighted| {
                f64::from(self.objective.score(mask, weighted.layout())) * weighted.probability()
            })
            .sum()
    }

    /// Removes duplicates, keeps the first `limit` candidates, scores them
    /// and returns them sorted by descending score.
    ///
    /// Candidates are expected best-first: of two identical patterns the
    /// earlier one is kept, and truncation happens after deduplication.
    /// Equal scores keep their input order.
    pub fn rank<P, I>(&self, candidates: I, limit: usize) -> Vec<RankedPattern<P>>
    where
        P: Pattern,
        I: IntoIterator<Item = P>,
    {
        let mut seen = HashSet::new();
        let finalists = candidates
            .into_iter()
            .filter(|pattern| seen.insert(pattern.clone()))
            .take(limit)
            .collect::<Vec<_>>();
        log::debug!(
            "scoring {} finalists against {} layouts",
            finalists.len(),
            self.layouts.len()
        );

        let mut ranked = finalists
            .into_iter()
            .map(|pattern| {
                let score = self.score(&pattern);
                RankedPattern { pattern, score }
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

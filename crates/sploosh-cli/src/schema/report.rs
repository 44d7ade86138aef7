use chrono::{DateTime, Utc};
use serde::Serialize;
use sploosh_engine::{Bitboard, Rules};
use sploosh_solver::{AutoplayResult, Decision, PartialSolution};

#[derive(Debug, Clone, Serialize)]
pub struct RulesSummary {
    pub width: u8,
    pub target_lengths: Vec<u8>,
}

impl From<&Rules> for RulesSummary {
    fn from(rules: &Rules) -> Self {
        Self {
            width: rules.width(),
            target_lengths: rules.target_lengths().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvolveReport<P> {
    pub created_at: DateTime<Utc>,
    pub rules: RulesSummary,
    pub objective: String,
    pub pattern_size: u32,
    pub population_size: usize,
    pub trials_per_round: u32,
    pub rounds: usize,
    pub seed: Option<u64>,
    /// Finalists sorted by exact score, best first.
    pub ranking: Vec<RankedEntry<P>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry<P> {
    pub pattern: P,
    pub mask: Bitboard,
    /// Probability-weighted objective score.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub created_at: DateTime<Utc>,
    pub rules: RulesSummary,
    pub partial: PartialSolution,
    pub samples: usize,
    pub seed: Option<u64>,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoplayReport {
    pub created_at: DateTime<Utc>,
    pub rules: RulesSummary,
    pub depth: usize,
    pub samples: usize,
    pub seed: Option<u64>,
    pub hidden_targets: Vec<Bitboard>,
    pub result: AutoplayResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutsReport {
    pub created_at: DateTime<Utc>,
    pub rules: RulesSummary,
    pub layout_count: usize,
    pub probability_sum: f64,
    pub min_probability: Option<f64>,
    pub max_probability: Option<f64>,
    /// Per-cell probability of being covered by a target, indexed `x + 8 * y`.
    pub occupancy: Vec<f64>,
    pub most_likely_cells: Bitboard,
}

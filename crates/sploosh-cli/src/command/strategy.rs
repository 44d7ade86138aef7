use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use sploosh_engine::{Bitboard, CELL_COUNT, LayoutSet};
use sploosh_solver::{GameSampling, PartialSolution, SolverConfig, StrategySolver};

use crate::{
    command::{RulesArg, SeedArg},
    schema::report::StrategyReport,
    util::{Output, SquareArg},
    view::board_display::BoardDisplay,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct StrategyArg {
    #[clap(flatten)]
    rules: RulesArg,
    #[clap(flatten)]
    seed: SeedArg,
    /// Cell shot without hitting anything, as `x,y` (repeatable)
    #[arg(long = "miss")]
    misses: Vec<SquareArg>,
    /// Cell shot and hit, as `x,y` (repeatable)
    #[arg(long = "hit")]
    hits: Vec<SquareArg>,
    /// Number of targets already sunk
    #[arg(long, default_value_t = 0)]
    sunk: u32,
    /// Shots simulated per game
    #[arg(long, default_value_t = 18)]
    depth: usize,
    /// Simulated games per decision
    #[arg(long, default_value_t = 100_000)]
    samples: usize,
    /// Layout choice for simulated games: `layoutindex` or `layoutprobability`
    #[arg(long, default_value = "layoutindex")]
    sampling: GameSampling,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &StrategyArg) -> anyhow::Result<()> {
    let rules = arg.rules.rules()?;
    let solver = StrategySolver::new(SolverConfig {
        depth: arg.depth,
        samples: arg.samples,
        sampling: arg.sampling,
    })
    .context("Invalid solver settings")?;

    let hits = arg
        .hits
        .iter()
        .map(|SquareArg(square)| *square)
        .collect::<Bitboard>();
    let misses = arg
        .misses
        .iter()
        .map(|SquareArg(square)| *square)
        .collect::<Bitboard>();
    if let Some(square) = (hits & misses).first() {
        anyhow::bail!("Cell {square} is given as both a hit and a miss");
    }
    if let Some(square) = ((hits | misses) & !rules.cells()).first() {
        anyhow::bail!("Cell {square} lies outside the {0}x{0} grid", rules.width());
    }
    let partial = PartialSolution::from_parts(hits | misses, hits, arg.sunk)
        .context("Invalid observations")?;

    eprintln!("Enumerating layouts...");
    let layouts = LayoutSet::enumerate(&rules);
    let mut rng = arg.seed.rng();
    eprintln!("Simulating {} games...", arg.samples);
    let decision = solver
        .best_shot(&layouts, &partial, &mut rng)
        .context("Failed to choose a shot")?;

    eprintln!("  Consistent layouts: {}", decision.consistent_layouts);
    eprintln!("  Games:              {}", decision.games);
    eprintln!("  Depth:              {}", decision.depth);
    // scores are unnormalised sums of layout probabilities
    let mut scores = [0.0; CELL_COUNT as usize];
    if decision.score > 0.0 {
        for candidate in &decision.candidates {
            scores[usize::from(candidate.square.index())] = candidate.score / decision.score;
        }
    }
    eprintln!("  Value per first shot (% of best):");
    eprint!("{}", BoardDisplay::heatmap(rules.width(), &scores));
    eprintln!("Best shot: {} (score {:.4})", decision.square, decision.score);

    let report = StrategyReport {
        created_at: Utc::now(),
        rules: (&rules).into(),
        partial,
        samples: arg.samples,
        seed: arg.seed.seed,
        decision,
    };
    Output::save_json(&report, arg.output.clone())?;
    Ok(())
}

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use rand::Rng as _;
use sploosh_engine::{LayoutSampler, LayoutSet};
use sploosh_solver::{DEFAULT_SHOT_BUDGET, GameSampling, SolverConfig, StrategySolver};

use crate::{
    command::{RulesArg, SeedArg},
    schema::report::AutoplayReport,
    util::Output,
    view::board_display::BoardDisplay,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoplayArg {
    #[clap(flatten)]
    rules: RulesArg,
    #[clap(flatten)]
    seed: SeedArg,
    /// Shots available before the game is lost
    #[arg(long, default_value_t = DEFAULT_SHOT_BUDGET)]
    budget: usize,
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

pub(crate) fn run(arg: &AutoplayArg) -> anyhow::Result<()> {
    let rules = arg.rules.rules()?;
    let solver = StrategySolver::new(SolverConfig {
        depth: arg.depth,
        samples: arg.samples,
        sampling: arg.sampling,
    })
    .context("Invalid solver settings")?;

    eprintln!("Enumerating layouts...");
    let layouts = LayoutSet::enumerate(&rules);
    let mut rng = arg.seed.rng();
    let hidden = rng.sample(LayoutSampler::new(&rules));

    let result = sploosh_solver::autoplay(&solver, &layouts, &hidden, arg.budget, &mut rng)
        .context("Solver failed during play")?;

    for (i, shot) in result.shots.iter().enumerate() {
        eprintln!(
            "Shot {:2}: {} -> {:?} (score {:.4e})",
            i + 1,
            shot.square,
            shot.outcome,
            shot.score
        );
    }
    eprint!(
        "{}",
        BoardDisplay::shots(
            rules.width(),
            result.shots.iter().map(|shot| (shot.square, shot.outcome)),
        )
    );
    eprintln!("Hidden targets:");
    eprint!("{}", BoardDisplay::mask(rules.width(), hidden.combined()));
    if result.won {
        eprintln!("All targets sunk in {} shots", result.shots.len());
    } else {
        eprintln!(
            "Out of shots: {} of {} targets sunk",
            result.targets_sunk,
            hidden.targets().len()
        );
    }

    let report = AutoplayReport {
        created_at: Utc::now(),
        rules: (&rules).into(),
        depth: arg.depth,
        samples: arg.samples,
        seed: arg.seed.seed,
        hidden_targets: hidden.targets().to_vec(),
        result,
    };
    Output::save_json(&report, arg.output.clone())?;
    Ok(())
}

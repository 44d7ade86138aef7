use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use sploosh_engine::{LayoutSet, MaskPattern, OrderedPattern, Pattern, Rules};
use sploosh_evaluator::{ExactEvaluator, Objective};
use sploosh_training::genetic::{Evolution, EvolutionConfig, RoundReport};

use crate::{
    command::{RulesArg, SeedArg},
    schema::report::{EvolveReport, RankedEntry},
    util::Output,
    view::board_display::PatternView,
};

/// How a guess pattern is represented.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum PatternForm {
    /// Unordered set of cells
    #[default]
    Mask,
    /// Cells in firing order
    Ordered,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvolveArg {
    #[clap(flatten)]
    rules: RulesArg,
    #[clap(flatten)]
    seed: SeedArg,
    /// Number of cells in each pattern
    #[arg(long, default_value_t = 8)]
    pattern_size: u32,
    /// Population size (even, at least 4)
    #[arg(long, default_value_t = 8192)]
    population: usize,
    /// Sampled layouts per round
    #[arg(long, default_value_t = 8192)]
    trials: u32,
    #[arg(long, default_value_t = 100)]
    rounds: usize,
    #[arg(long, default_value = "atleast1")]
    objective: Objective,
    #[arg(long, default_value = "mask")]
    form: PatternForm,
    /// Number of distinct finalists scored exactly
    #[arg(long, default_value_t = 100)]
    top: usize,
    /// Number of ranked finalists printed
    #[arg(long, default_value_t = 5)]
    show: usize,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvolveArg) -> anyhow::Result<()> {
    let rules = arg.rules.rules()?;
    let config = EvolutionConfig {
        pattern_size: arg.pattern_size,
        population_size: arg.population,
        trials_per_round: arg.trials,
        rounds: arg.rounds,
        objective: arg.objective,
    };
    let mut rng = arg.seed.rng();
    match arg.form {
        PatternForm::Mask => run_form::<MaskPattern, _>(arg, &rules, config, &mut rng),
        PatternForm::Ordered => run_form::<OrderedPattern, _>(arg, &rules, config, &mut rng),
    }
}

fn run_form<P, R>(
    arg: &EvolveArg,
    rules: &Rules,
    config: EvolutionConfig,
    rng: &mut R,
) -> anyhow::Result<()>
where
    P: Pattern + PatternView + Serialize,
    R: Rng,
{
    let evolution = Evolution::<P>::new(rules, config).context("Invalid evolution settings")?;

    eprintln!(
        "Evolving {:?} patterns of {} cells for {} ({} rounds, population {}, {} trials)",
        arg.form,
        config.pattern_size,
        config.objective,
        config.rounds,
        config.population_size,
        config.trials_per_round,
    );
    let population = evolution.run(rng, |round, report| {
        print_round(rules.width(), round, report);
    });

    log::info!(
        "evolution finished with {} members",
        population.individuals().len()
    );

    eprintln!("Enumerating layouts for final rating...");
    let layouts = LayoutSet::enumerate(rules);
    let evaluator = ExactEvaluator::new(&layouts, config.objective);
    let ranking = evaluator.rank(population.finalists(arg.top), arg.top);

    eprintln!("{} best (unique):", arg.show.min(ranking.len()));
    for (i, ranked) in ranking.iter().take(arg.show).enumerate() {
        eprintln!("#{}", i + 1);
        eprint!("{}", ranked.pattern.board(rules.width()));
        eprintln!("Probability: {:.4}%", 100.0 * ranked.score);
        eprintln!();
    }

    let report = EvolveReport {
        created_at: Utc::now(),
        rules: rules.into(),
        objective: config.objective.to_string(),
        pattern_size: config.pattern_size,
        population_size: config.population_size,
        trials_per_round: config.trials_per_round,
        rounds: config.rounds,
        seed: arg.seed.seed,
        ranking: ranking
            .into_iter()
            .map(|ranked| RankedEntry {
                mask: ranked.pattern.mask(),
                pattern: ranked.pattern,
                score: ranked.score,
            })
            .collect(),
    };
    Output::save_json(&report, arg.output.clone())?;
    Ok(())
}

fn print_round<P>(width: u8, round: usize, report: &RoundReport<P>)
where
    P: PatternView,
{
    eprintln!("Round {round}");
    eprintln!("  Best:");
    eprint!("{}", report.best.board(width));
    eprintln!("  Top hit rates (%):    {:.3?}", report.top);
    eprintln!("  Bottom hit rates (%): {:.3?}", report.bottom);
    eprintln!("  Fitness Stats (%):");
    eprintln!("    Min:    {:.3}", report.stats.min);
    eprintln!("    Max:    {:.3}", report.stats.max);
    eprintln!("    Mean:   {:.3}", report.stats.mean);
    eprintln!("    Median: {:.3}", report.stats.median);
    eprintln!("    StdDev: {:.3}", report.stats.std_dev);
}

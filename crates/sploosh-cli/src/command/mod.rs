use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::SeedableRng as _;
use rand_pcg::Pcg64Mcg;
use sploosh_engine::Rules;

use self::{
    autoplay::AutoplayArg, evolve::EvolveArg, layouts::LayoutsArg, strategy::StrategyArg,
};

mod autoplay;
mod evolve;
mod layouts;
mod strategy;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a fixed guess pattern and rank the finalists exactly
    Evolve(#[clap(flatten)] EvolveArg),
    /// Pick the best next shot for a partially played game
    Strategy(#[clap(flatten)] StrategyArg),
    /// Let the solver play a whole game against a random layout
    Autoplay(#[clap(flatten)] AutoplayArg),
    /// Enumerate every layout and show the occupancy heatmap
    Layouts(#[clap(flatten)] LayoutsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Layouts(LayoutsArg::default())) {
        Mode::Evolve(arg) => evolve::run(&arg)?,
        Mode::Strategy(arg) => strategy::run(&arg)?,
        Mode::Autoplay(arg) => autoplay::run(&arg)?,
        Mode::Layouts(arg) => layouts::run(&arg)?,
    }
    Ok(())
}

/// Grid and targets of the game being analysed.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RulesArg {
    /// Width and height of the grid
    #[arg(long, default_value_t = 8)]
    width: u8,
    /// Target lengths, in placement order
    #[arg(long, value_delimiter = ',', default_value = "2,3,4")]
    targets: Vec<u8>,
}

impl Default for RulesArg {
    fn default() -> Self {
        let rules = Rules::standard();
        Self {
            width: rules.width(),
            targets: rules.target_lengths().to_vec(),
        }
    }
}

impl RulesArg {
    pub(crate) fn rules(&self) -> anyhow::Result<Rules> {
        Rules::new(self.width, &self.targets).with_context(|| {
            format!(
                "Invalid rules: width {}, targets {:?}",
                self.width, self.targets
            )
        })
    }
}

/// Random number generator seed.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SeedArg {
    /// Seed for reproducible runs (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

impl SeedArg {
    pub(crate) fn rng(&self) -> Pcg64Mcg {
        match self.seed {
            Some(seed) => Pcg64Mcg::seed_from_u64(seed),
            None => Pcg64Mcg::from_rng(&mut rand::rng()),
        }
    }
}

use std::path::PathBuf;

use chrono::Utc;
use sploosh_engine::LayoutSet;

use crate::{
    command::RulesArg,
    schema::report::LayoutsReport,
    util::Output,
    view::board_display::BoardDisplay,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct LayoutsArg {
    #[clap(flatten)]
    rules: RulesArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &LayoutsArg) -> anyhow::Result<()> {
    let LayoutsArg { rules, output } = arg;
    let rules = rules.rules()?;

    eprintln!("Enumerating layouts...");
    let layouts = LayoutSet::enumerate(&rules);
    let occupancy = layouts.marginal_occupancy();
    let range = layouts.probability_range();

    eprintln!("  Layouts:         {}", layouts.len());
    eprintln!("  Probability sum: {:.12}", layouts.probability_sum());
    if let Some((min, max)) = range {
        eprintln!("  Min probability: {min:.3e}");
        eprintln!("  Max probability: {max:.3e}");
    }
    eprintln!("  Occupancy (%):");
    eprint!("{}", BoardDisplay::heatmap(rules.width(), &occupancy));
    eprintln!("  Most likely cells:");
    eprint!("{}", BoardDisplay::mask(rules.width(), layouts.argmax_cells()));

    let report = LayoutsReport {
        created_at: Utc::now(),
        rules: (&rules).into(),
        layout_count: layouts.len(),
        probability_sum: layouts.probability_sum(),
        min_probability: range.map(|(min, _)| min),
        max_probability: range.map(|(_, max)| max),
        occupancy: occupancy.to_vec(),
        most_likely_cells: layouts.argmax_cells(),
    };
    Output::save_json(&report, output.clone())?;
    Ok(())
}

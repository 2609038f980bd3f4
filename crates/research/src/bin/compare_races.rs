use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use double_spend_sim::prelude::*;
use research::{
    default_betas, default_hours, hours_to_secs, init_tracing, RacePolicy,
    SimulationArgs,
};

/// Tally both race policies over the same grid of scenarios
#[derive(Debug, Parser)]
#[command(name = "compare_races")]
struct Cli {
    /// Attacker hash power shares (comma-separated)
    #[arg(short, long, value_delimiter = ',', default_values_t = default_betas())]
    betas: Vec<f64>,

    /// Attacker time budgets in hours (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = default_hours())]
    hours: Vec<f64>,

    /// Print the table as CSV
    #[arg(long)]
    csv: bool,

    #[command(flatten)]
    sim: SimulationArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let start = Instant::now();
    let cli = Cli::parse();

    let sweep = ScenarioSweep::new(cli.betas, hours_to_secs(&cli.hours))
        .with_depth(cli.sim.depth)
        .with_mean_interval(cli.sim.mean_interval);

    let mut summaries = vec![];
    for policy in [RacePolicy::Continuous, RacePolicy::SplitStream] {
        let simulation = cli.sim.simulation(policy)?;
        summaries.extend(sweep.tally(&simulation)?.summaries);
    }

    // Interleave the policies so each scenario's rows sit together
    let scenarios = sweep.len();
    let rows = (0..scenarios).flat_map(|i| [&summaries[i], &summaries[scenarios + i]]);

    let format = if cli.csv { Format::CSV } else { Format::PrettyPrint };
    println!("{}", ResultsTable::new(rows).format(format));

    println!("elapsed time: {:.4} secs", start.elapsed().as_secs_f64());
    Ok(())
}

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use double_spend_sim::prelude::*;
use research::{
    default_betas, default_hours, hours_to_secs, init_tracing, RacePolicy,
    SimulationArgs,
};

/// Sweep attacker power and time budget, writing every trial to CSV
#[derive(Debug, Parser)]
#[command(name = "sweep")]
struct Cli {
    /// Race policy used for every trial
    #[arg(short, long, value_enum, default_value_t = RacePolicy::Continuous)]
    race: RacePolicy,

    /// Attacker hash power shares (comma-separated)
    #[arg(short, long, value_delimiter = ',', default_values_t = default_betas())]
    betas: Vec<f64>,

    /// Attacker time budgets in hours (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = default_hours())]
    hours: Vec<f64>,

    /// Directory receiving one CSV file per scenario
    #[arg(short, long, default_value = "1m")]
    out: String,

    /// Print the summary table as CSV
    #[arg(long)]
    csv: bool,

    #[command(flatten)]
    sim: SimulationArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let start = Instant::now();
    let cli = Cli::parse();

    let simulation = cli.sim.simulation(cli.race)?;
    let mut sink = CsvDirectory::create(&cli.out)
        .with_context(|| format!("creating output directory {}", cli.out))?;

    let report = ScenarioSweep::new(cli.betas, hours_to_secs(&cli.hours))
        .with_depth(cli.sim.depth)
        .with_mean_interval(cli.sim.mean_interval)
        .run(&simulation, &mut sink)?;

    let format = if cli.csv { Format::CSV } else { Format::PrettyPrint };
    println!("{}", report.table().format(format));

    println!("elapsed time: {:.4} secs", start.elapsed().as_secs_f64());
    Ok(())
}

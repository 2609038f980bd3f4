use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use double_spend_sim::prelude::*;
use research::{init_tracing, RacePolicy};

/// Estimate the attacker's win probability for a single scenario
#[derive(Debug, Parser)]
#[command(name = "single")]
struct Cli {
    /// Race policy used for every trial
    #[arg(short, long, value_enum, default_value_t = RacePolicy::Continuous)]
    race: RacePolicy,

    /// Attacker hash power share
    #[arg(short, long, default_value_t = 0.3)]
    beta: f64,

    /// Attacker time budget in hours
    #[arg(long, default_value_t = 120.0)]
    hours: f64,

    /// Trials to run
    #[arg(short = 'n', long, default_value_t = 100_000)]
    trials: usize,

    /// Confirmation depth the attacker must reach
    #[arg(short = 'z', long, default_value_t = 5)]
    depth: u32,

    /// Mean block interval in seconds
    #[arg(long, default_value_t = 600.0)]
    mean_interval: f64,

    /// Seed for reproducible runs (drawn from the OS when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    init_tracing();
    let start = Instant::now();
    let cli = Cli::parse();

    let params = Parameters::new(cli.beta, cli.hours * 3600.0)
        .with_depth(cli.depth)
        .with_mean_interval(cli.mean_interval);

    let builder = Simulation::builder().boxed_race(cli.race.race()).trials(cli.trials);
    let simulation = match cli.seed {
        Some(seed) => builder.seed(seed).build()?,
        None => builder.build()?,
    };

    let summary = simulation.tally(&params)?;

    println!("Race: {}", summary.race);
    println!("Simulation Counts: {}", summary.trials);
    println!("Attacker Wins: {}", summary.wins);
    println!("Attacker Win Probability: {:.6}", summary.win_rate());

    println!("elapsed time: {:.4} secs", start.elapsed().as_secs_f64());
    Ok(())
}

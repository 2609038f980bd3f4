//! Shared pieces of the experiment programs.

use clap::{Args, ValueEnum};
use double_spend_sim::prelude::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr at `info` unless `RUST_LOG` says otherwise, leaving stdout
/// to the results.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Race policies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RacePolicy {
    /// Separate attacker and honest clocks
    Continuous,
    /// One merged block stream routed by hash power
    SplitStream,
}

impl RacePolicy {
    pub fn race(self) -> Box<dyn Race> {
        match self {
            RacePolicy::Continuous => Box::new(ContinuousRace::new()),
            RacePolicy::SplitStream => Box::new(SplitStreamRace::new()),
        }
    }
}

/// Options common to every program.
#[derive(Debug, Clone, Args)]
pub struct SimulationArgs {
    /// Trials per scenario
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    pub trials: usize,

    /// Confirmation depth the attacker must reach
    #[arg(short = 'z', long, default_value_t = 6)]
    pub depth: u32,

    /// Mean block interval in seconds
    #[arg(long, default_value_t = 600.0)]
    pub mean_interval: f64,

    /// Seed for reproducible runs (drawn from the OS when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Trials sharing one random stream
    #[arg(long, default_value_t = double_spend_sim::simulation::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl SimulationArgs {
    pub fn simulation(&self, policy: RacePolicy) -> Result<Simulation, SimulationBuildError> {
        let builder = Simulation::builder()
            .boxed_race(policy.race())
            .trials(self.trials)
            .batch_size(self.batch_size);

        match self.seed {
            Some(seed) => builder.seed(seed).build(),
            None => builder.build(),
        }
    }
}

/// Attacker powers of the published sweeps: 10% to 45% in steps of 5%.
pub fn default_betas() -> Vec<PowerValue> {
    (10..=45).step_by(5).percent().collect()
}

/// Time budgets of the published sweeps: 1 to 24 hours.
pub fn default_hours() -> Vec<f64> {
    (1..=24).map(f64::from).collect()
}

pub fn hours_to_secs(hours: &[f64]) -> Vec<f64> {
    hours.iter().map(|h| h * 3600.0).collect()
}

/*!
Sweeping a grid of attacker powers and time budgets

# Examples

Writing every trial of a small sweep to memory:

```
use double_spend_sim::prelude::*;

let sim = Simulation::builder()
    .race(ContinuousRace::new())
    .trials(100)
    .seed(1)
    .build()
    .unwrap();

let mut results: Vec<ScenarioResult> = vec![];
let report = ScenarioSweep::new((10..=30).step_by(10).percent(), [3600.0, 7200.0])
    .with_depth(6)
    .run(&sim, &mut results)
    .unwrap();

assert_eq!(results.len(), 6);
assert_eq!(report.summaries.len(), 6);
```
*/

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use tracing::{info, warn};

use crate::{
    params::{ParameterError, Parameters, PowerValue, DEFAULT_DEPTH, DEFAULT_MEAN_INTERVAL},
    race::Race,
    results::{ScenarioResult, ScenarioSummary, SweepReport},
    simulation::{Simulation, SimulationError},
    sink::ResultSink,
};

/// Runs all the trials of one scenario at a time on behalf of a
/// [`ScenarioSweep`].
pub trait ScenarioRunner {
    fn run_scenario(&self, params: &Parameters) -> Result<ScenarioResult, SimulationError>;

    /// Counts wins without keeping the individual trials.
    fn tally(&self, params: &Parameters) -> Result<ScenarioSummary, SimulationError> {
        Ok(self.run_scenario(params)?.summary())
    }
}

impl ScenarioRunner for Simulation {
    fn run_scenario(&self, params: &Parameters) -> Result<ScenarioResult, SimulationError> {
        Simulation::run_scenario(self, params)
    }

    fn tally(&self, params: &Parameters) -> Result<ScenarioSummary, SimulationError> {
        Simulation::tally(self, params)
    }
}

/// The cartesian product of attacker powers and time budgets, run in
/// row-major order: every time budget for the first power, then every time
/// budget for the second power, and so on.
#[derive(Debug, Clone)]
pub struct ScenarioSweep {
    betas: Vec<PowerValue>,
    time_budgets: Vec<f64>,
    mean_interval: f64,
    depth: u32,
    cancel: Option<Arc<AtomicBool>>,
}

impl ScenarioSweep {
    pub fn new<B, T>(betas: B, time_budgets: T) -> Self
    where
        B: IntoIterator<Item = PowerValue>,
        T: IntoIterator<Item = f64>,
    {
        Self {
            betas: betas.into_iter().collect(),
            time_budgets: time_budgets.into_iter().collect(),
            mean_interval: DEFAULT_MEAN_INTERVAL,
            depth: DEFAULT_DEPTH,
            cancel: None,
        }
    }

    pub fn with_mean_interval(mut self, mean_interval: f64) -> Self {
        self.mean_interval = mean_interval;

        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;

        self
    }

    /// The sweep stops before its next scenario once `flag` is set.
    /// Scenarios already handed to the sink are unaffected.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);

        self
    }

    /// Number of scenarios in the sweep.
    pub fn len(&self) -> usize {
        self.betas.len() * self.time_budgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the parameters of every scenario, in the order they are run.
    pub fn scenarios(&self) -> impl Iterator<Item = Parameters> + '_ {
        self.betas.iter().flat_map(move |&beta| {
            self.time_budgets.iter().map(move |&time_budget| {
                Parameters::new(beta, time_budget)
                    .with_mean_interval(self.mean_interval)
                    .with_depth(self.depth)
            })
        })
    }

    /// Checks the parameters of every scenario.
    pub fn validate(&self) -> Result<(), ParameterError> {
        self.scenarios().try_for_each(|params| params.validate())
    }

    /// Runs every scenario with `runner`, passing each result to `sink` as
    /// soon as it is complete.
    pub fn run<R, S>(&self, runner: &R, sink: &mut S) -> Result<SweepReport, SimulationError>
    where
        R: ScenarioRunner + ?Sized,
        S: ResultSink + ?Sized,
    {
        self.drive(|params| {
            let result = runner.run_scenario(params)?;
            let summary = result.summary();
            sink.accept(result).map_err(SimulationError::Sink)?;

            Ok(summary)
        })
    }

    /// Runs every scenario with `runner`, keeping only win counts.
    pub fn tally<R>(&self, runner: &R) -> Result<SweepReport, SimulationError>
    where
        R: ScenarioRunner + ?Sized,
    {
        self.drive(|params| runner.tally(params))
    }

    fn drive<F>(&self, mut run: F) -> Result<SweepReport, SimulationError>
    where
        F: FnMut(&Parameters) -> Result<ScenarioSummary, SimulationError>,
    {
        self.validate()?;

        let start = Instant::now();
        let total = self.len();
        let mut summaries = Vec::with_capacity(total);
        let mut cancelled = false;

        for params in self.scenarios() {
            if self.is_cancelled() {
                warn!(completed = summaries.len(), total, "sweep cancelled");
                cancelled = true;
                break;
            }

            summaries.push(run(&params)?);
        }

        let elapsed = start.elapsed();
        if !cancelled {
            info!(scenarios = total, elapsed_secs = elapsed.as_secs_f64(), "sweep complete");
        }

        Ok(SweepReport { summaries, cancelled, elapsed })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Runs `trials` trials of every (beta, time budget) scenario under `race`,
/// with the default mean interval and depth, seeding the simulation from the
/// operating system.
pub fn run_sweep<R, S>(
    betas: &[PowerValue],
    time_budgets: &[f64],
    trials: usize,
    race: R,
    sink: &mut S,
) -> Result<SweepReport, SimulationError>
where
    R: Race + 'static,
    S: ResultSink + ?Sized,
{
    let sim = Simulation::builder().race(race).trials(trials).build()?;

    ScenarioSweep::new(betas.iter().copied(), time_budgets.iter().copied()).run(&sim, sink)
}

/*!
Re-export of common values and datatypes

Must be imported manually.

```
use double_spend_sim::prelude::*;
```
*/

use crate::{params, race, results, rng, sampler, simulation, sink, sweep};

pub use params::{ParameterError, Parameters, Percent, PowerValue};

pub use race::{
    continuous::ContinuousRace, split_stream::SplitStreamRace, Race, RaceError,
    TrialOutcome,
};

pub use results::{
    Format, ResultsTable, RunningStatistics, ScenarioResult, ScenarioSummary,
    SweepReport, TrialRecord,
};

pub use rng::{EntropyStream, RandomSource};

pub use sampler::IntervalSampler;

pub use simulation::{
    run_scenario, Simulation, SimulationBuildError, SimulationBuilder,
    SimulationError,
};

pub use sink::{CsvDirectory, ResultSink, SinkError};

pub use sweep::{run_sweep, ScenarioRunner, ScenarioSweep};

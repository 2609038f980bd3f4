//! Running the trials of a scenario and aggregating their outcomes

use std::num::NonZeroUsize;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    params::{ParameterError, Parameters},
    race::{Race, RaceError, TrialOutcome},
    results::{ScenarioResult, ScenarioSummary, TrialRecord},
    rng::{scenario_key, EntropyStream, RandomSource},
    sink::SinkError,
};

pub mod builder;

pub use builder::{SimulationBuildError, SimulationBuilder, DEFAULT_BATCH_SIZE};

/// Runs a fixed number of trials of one [`Race`] policy per scenario.
///
/// # Details
/// The trials of a scenario are split into consecutive batches of
/// `batch_size` trials. Batch `k` draws from stream `k` of a ChaCha8
/// generator keyed by the simulation seed and the scenario's parameters, and
/// batch outputs are put back together in trial order. The outcome of every
/// trial therefore depends only on the seed, the batch size and the
/// scenario, never on how many threads ran the batches.
#[derive(Debug, Clone)]
pub struct Simulation {
    race: Box<dyn Race>,
    trials: NonZeroUsize,
    seed: u64,
    batch_size: NonZeroUsize,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid scenario parameters")]
    InvalidParameter(#[from] ParameterError),
    #[error("trial failed")]
    Race(#[from] RaceError),
    #[error("could not build simulation")]
    Build(#[from] SimulationBuildError),
    #[error("result sink failed")]
    Sink(#[source] SinkError),
}

/// Contiguous range of trials sharing one random stream.
#[derive(Debug, Clone, Copy)]
struct Batch {
    stream: u64,
    len: usize,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    pub fn race(&self) -> &dyn Race {
        self.race.as_ref()
    }

    pub fn trials(&self) -> usize {
        self.trials.get()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs every trial of the scenario described by `params` and returns them
    /// in trial order with their running win rates.
    pub fn run_scenario(&self, params: &Parameters) -> Result<ScenarioResult, SimulationError> {
        params.validate()?;

        let key = scenario_key(self.seed, params);
        let mut records = vec![TrialRecord::pending(); self.trials.get()];
        self.fill_batches(records.as_mut_slice(), |stream, slots| {
            let mut rng = EntropyStream::from_seed_stream(key, stream);

            for slot in slots {
                slot.outcome = self.race.run(params, &mut rng)?;
            }

            Ok(())
        })?;

        let result = ScenarioResult::from_records(*params, self.race.name(), records);
        log_completed(&result.summary());

        Ok(result)
    }

    /// Counts the wins of the scenario described by `params` without keeping
    /// the individual trials. Produces the same win count as
    /// [`.run_scenario()`](Self::run_scenario).
    pub fn tally(&self, params: &Parameters) -> Result<ScenarioSummary, SimulationError> {
        params.validate()?;

        let key = scenario_key(self.seed, params);
        let wins_per_batch = self.map_batches(|batch| {
            let mut rng = EntropyStream::from_seed_stream(key, batch.stream);

            let mut wins = 0u64;
            for _ in 0..batch.len {
                wins += u64::from(self.race.run(params, &mut rng)?.won);
            }

            Ok(wins)
        })?;

        let summary = ScenarioSummary {
            params: *params,
            race: self.race.name(),
            trials: self.trials.get() as u64,
            wins: wins_per_batch.into_iter().sum(),
        };
        log_completed(&summary);

        Ok(summary)
    }

    /// Runs every trial of the scenario in order on the calling thread,
    /// drawing all randomness from `rng` instead of the simulation's own
    /// streams.
    pub fn run_with_source(
        &self,
        params: &Parameters,
        rng: &mut dyn RandomSource,
    ) -> Result<ScenarioResult, SimulationError> {
        params.validate()?;

        let outcomes = (0..self.trials.get())
            .map(|_| self.race.run(params, rng))
            .collect::<Result<Vec<TrialOutcome>, _>>()?;

        Ok(ScenarioResult::from_outcomes(*params, self.race.name(), outcomes))
    }

    fn batches(&self) -> Vec<Batch> {
        let (trials, size) = (self.trials.get(), self.batch_size.get());

        (0..trials.div_ceil(size))
            .map(|k| Batch { stream: k as u64, len: size.min(trials - k * size) })
            .collect()
    }

    /// Applies `f` to every batch, in parallel when the `rayon` feature is
    /// enabled, and returns the outputs in batch order.
    fn map_batches<T, F>(&self, f: F) -> Result<Vec<T>, RaceError>
    where
        T: Send,
        F: Fn(Batch) -> Result<T, RaceError> + Send + Sync,
    {
        let batches = self.batches();
        debug!(batches = batches.len(), trials = self.trials.get(), "running batches");

        #[cfg(feature = "rayon")]
        let outputs = batches.into_par_iter().map(f).collect();
        #[cfg(not(feature = "rayon"))]
        let outputs = batches.into_iter().map(f).collect();

        outputs
    }

    /// Hands `f` the stream id and slots of every batch of `slots`, in
    /// parallel when the `rayon` feature is enabled. Batches cover the same
    /// trials as in [`.map_batches()`](Self::map_batches).
    fn fill_batches<T, F>(&self, slots: &mut [T], f: F) -> Result<(), RaceError>
    where
        T: Send,
        F: Fn(u64, &mut [T]) -> Result<(), RaceError> + Send + Sync,
    {
        let size = self.batch_size.get();
        debug!(batches = slots.len().div_ceil(size), trials = slots.len(), "running batches");

        #[cfg(feature = "rayon")]
        let filled = slots
            .par_chunks_mut(size)
            .enumerate()
            .try_for_each(|(k, chunk)| f(k as u64, chunk));
        #[cfg(not(feature = "rayon"))]
        let filled = slots
            .chunks_mut(size)
            .enumerate()
            .try_for_each(|(k, chunk)| f(k as u64, chunk));

        filled
    }
}

fn log_completed(summary: &ScenarioSummary) {
    info!(
        race = %summary.race,
        beta = summary.params.beta,
        time_budget = summary.params.time_budget,
        depth = summary.params.depth,
        trials = summary.trials,
        wins = summary.wins,
        win_rate = summary.win_rate(),
        "scenario complete"
    );
}

/// Runs `trials` trials of the scenario described by `params` under `race`,
/// seeding the simulation from the operating system.
pub fn run_scenario<R: Race + 'static>(
    params: &Parameters,
    trials: usize,
    race: R,
) -> Result<ScenarioResult, SimulationError> {
    Simulation::builder().race(race).trials(trials).build()?.run_scenario(params)
}

#[cfg(test)]
mod tests {
    use super::{Simulation, SimulationError};
    use crate::{
        params::{ParameterError, Parameters},
        race::{ContinuousRace, Race, RaceError, SplitStreamRace},
        rng::{
            scenario_key,
            testing::{Exhausted, Scripted},
            EntropyStream,
        },
    };

    fn races() -> [Box<dyn Race>; 2] {
        [Box::new(ContinuousRace::new()), Box::new(SplitStreamRace::new())]
    }

    fn simulation(race: Box<dyn Race>, trials: usize) -> Simulation {
        Simulation::builder()
            .boxed_race(race)
            .trials(trials)
            .seed(0x5EED)
            .batch_size(1000)
            .build()
            .unwrap()
    }

    #[test]
    fn exact_running_win_rate_from_scripted_source() {
        // depth 1, priming block at 1s, then (honest, attacker) per round:
        // a trial wins when the attacker interval keeps it behind the honest
        // clock and loses when the priming block misses the deadline
        let params = Parameters::new(0.3, 100.0).with_depth(1);
        let mut rng = Scripted::intervals([
            1.0, 10.0, 1.0, // win
            200.0, // loss
            1.0, 10.0, 1.0, // win
            1.0, 10.0, 1.0, // win
            200.0, // loss
        ]);

        let sim = simulation(Box::new(ContinuousRace::new()), 5);
        let result = sim.run_with_source(&params, &mut rng).unwrap();

        let won: Vec<_> = result.records.iter().map(|r| r.outcome.won).collect();
        let rates: Vec<_> = result.records.iter().map(|r| r.win_rate).collect();

        assert_eq!(won, [true, false, true, true, false]);
        assert_eq!(rates, [1.0, 0.5, 2.0 / 3.0, 0.75, 0.6]);
        assert_eq!(result.wins(), 3);
    }

    #[test]
    fn outcomes_are_well_formed() {
        let params = Parameters::new(0.35, 4.0 * 3600.0);

        for race in races() {
            let result = simulation(race, 5_000).run_scenario(&params).unwrap();

            assert_eq!(result.records.len(), 5_000);
            for record in &result.records {
                let outcome = record.outcome;
                assert!(outcome.finish_time >= 0.0);
                assert!(outcome.finish_time <= params.time_budget);
                if outcome.won {
                    assert!(outcome.attacker_height >= u64::from(params.depth));
                }
            }
        }
    }

    #[test]
    fn negligible_attacker_never_wins() {
        let params = Parameters::new(1e-6, 24.0 * 3600.0);

        for race in races() {
            let summary = simulation(race, 20_000).tally(&params).unwrap();
            assert!(summary.win_rate() < 0.001, "{}: {}", summary.race, summary.win_rate());
        }
    }

    #[test]
    fn dominant_attacker_almost_always_wins() {
        let params = Parameters::new(0.99, 1e7);

        for race in races() {
            let summary = simulation(race, 20_000).tally(&params).unwrap();
            assert!(summary.win_rate() > 0.95, "{}: {}", summary.race, summary.win_rate());
        }
    }

    #[test]
    fn reproducible_for_a_seed() {
        let params = Parameters::new(0.3, 6.0 * 3600.0);

        for race in races() {
            let sim = simulation(race, 2_500);
            assert_eq!(sim.run_scenario(&params).unwrap(), sim.run_scenario(&params).unwrap());
        }
    }

    #[test]
    fn tally_matches_full_run() {
        let params = Parameters::new(0.4, 3.0 * 3600.0);

        for race in races() {
            let sim = simulation(race, 3_333);
            let result = sim.run_scenario(&params).unwrap();
            let summary = sim.tally(&params).unwrap();

            assert_eq!(summary, result.summary());
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn thread_count_does_not_change_results() {
        let params = Parameters::new(0.35, 5.0 * 3600.0);

        for race in races() {
            let sim = simulation(race, 4_500);
            let on_threads = |threads| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .unwrap()
                    .install(|| (sim.run_scenario(&params).unwrap(), sim.tally(&params).unwrap()))
            };

            let (one, one_tally) = on_threads(1);
            let (four, four_tally) = on_threads(4);

            assert_eq!(one, four);
            assert_eq!(one_tally, four_tally);
            assert_eq!(one.summary(), four_tally);
        }
    }

    #[test]
    fn single_batch_replays_stream_zero() {
        let params = Parameters::new(0.3, 2.0 * 3600.0);

        for race in races() {
            let sim = Simulation::builder()
                .boxed_race(race)
                .trials(2_000)
                .seed(0x5EED)
                .batch_size(2_000)
                .build()
                .unwrap();
            let mut rng = EntropyStream::from_seed_stream(scenario_key(sim.seed(), &params), 0);

            assert_eq!(
                sim.run_scenario(&params).unwrap(),
                sim.run_with_source(&params, &mut rng).unwrap()
            );
        }
    }

    #[test]
    fn scenarios_use_unrelated_streams() {
        let sim = simulation(Box::new(SplitStreamRace::new()), 200);

        let a = sim.run_scenario(&Parameters::new(0.3, 7200.0)).unwrap();
        let b = sim.run_scenario(&Parameters::new(0.3, 7201.0)).unwrap();

        let finish = |r: &crate::results::ScenarioResult| -> Vec<f64> {
            r.records.iter().map(|rec| rec.outcome.finish_time).collect()
        };
        assert_ne!(finish(&a), finish(&b));
    }

    #[test]
    fn invalid_parameters_fail_before_sampling() {
        let sim = simulation(Box::new(ContinuousRace::new()), 10);

        let err = sim.run_with_source(&Parameters::new(1.2, 3600.0), &mut Exhausted).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InvalidParameter(ParameterError::BadPowerValue(_))
        ));

        let err = sim.run_scenario(&Parameters::new(0.3, 3600.0).with_depth(0)).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter(ParameterError::ZeroDepth)));
    }

    #[test]
    fn exhausted_source_fails_the_scenario() {
        let sim = simulation(Box::new(SplitStreamRace::new()), 3);

        let err = sim.run_with_source(&Parameters::new(0.3, 3600.0), &mut Exhausted).unwrap_err();

        assert!(matches!(err, SimulationError::Race(RaceError::RandomSourceExhausted(_))));
    }

    #[test]
    fn loop_bound_surfaces_as_error() {
        let sim = simulation(Box::new(SplitStreamRace::with_arrival_cap(1)), 10);

        let err = sim.run_scenario(&Parameters::new(0.3, 1e9)).unwrap_err();

        assert!(matches!(err, SimulationError::Race(RaceError::LoopBoundExceeded { .. })));
    }
}

//! Implementation of the race in which every block of a single network-wide
//! stream is assigned to one side, via the [`Race`] trait.

use crate::{params::Parameters, rng::RandomSource, sampler::IntervalSampler};

use super::{Race, RaceError, TrialOutcome, DEFAULT_ROUND_CAP};

/// Models the whole network as one Poisson block stream with the mean block
/// interval, each arrival going to the attacker with probability `beta` and
/// to the honest chain otherwise.
///
/// The honest chain starts one block ahead. Each step draws the next interval
/// and stops with a loss, before routing, if the arrival would land after the
/// deadline. The attacker wins as soon as its height reaches the confirmation
/// depth while strictly exceeding the honest height.
#[derive(Debug, Clone)]
pub struct SplitStreamRace {
    arrival_cap: u64,
}

impl SplitStreamRace {
    pub fn new() -> Self {
        Self { arrival_cap: DEFAULT_ROUND_CAP }
    }

    /// Sets the number of block arrivals after which a trial is reported as
    /// [`RaceError::LoopBoundExceeded`].
    pub fn with_arrival_cap(arrival_cap: u64) -> Self {
        Self { arrival_cap }
    }
}

impl Default for SplitStreamRace {
    fn default() -> Self {
        Self::new()
    }
}

impl Race for SplitStreamRace {
    fn name(&self) -> String {
        "Split Stream".into()
    }

    fn run(
        &self,
        params: &Parameters,
        rng: &mut dyn RandomSource,
    ) -> Result<TrialOutcome, RaceError> {
        params.validate()?;

        let sampler = IntervalSampler::new(params.mean_interval);
        let deadline = params.time_budget;
        let depth = u64::from(params.depth);

        let mut clock = 0.0;
        let mut attacker_height = 0;
        let mut honest_height = 1;

        for _ in 0..self.arrival_cap {
            let interval = sampler.sample(1.0, rng)?;
            if clock + interval > deadline {
                return Ok(TrialOutcome::loss(deadline, attacker_height));
            }

            clock += interval;
            if rng.bernoulli(params.beta)? {
                attacker_height += 1;
            } else {
                honest_height += 1;
            }

            if attacker_height >= depth && attacker_height > honest_height {
                return Ok(TrialOutcome::win(clock, attacker_height));
            }
        }

        Err(RaceError::LoopBoundExceeded { race: self.name(), cap: self.arrival_cap })
    }
}

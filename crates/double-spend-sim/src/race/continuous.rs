//! Implementation of the race in which attacker and honest miners keep
//! separate clocks, via the [`Race`] trait.

use crate::{params::Parameters, rng::RandomSource, sampler::IntervalSampler};

use super::{Race, RaceError, TrialOutcome, DEFAULT_ROUND_CAP};

/// Models the attacker and the honest network as two independent Poisson
/// processes, advanced one block each per round.
///
/// The attacker first mines one priming block on its own. Every round then
/// draws the honest interval followed by the attacker interval. After round
/// `r` the attacker loses if its clock has passed the deadline, and otherwise
/// wins once `r >= depth - 1` and its clock is no later than the honest clock.
/// The attacker's height at the end of round `r` is `r + 1`, counting the
/// priming block.
#[derive(Debug, Clone)]
pub struct ContinuousRace {
    round_cap: u64,
}

impl ContinuousRace {
    pub fn new() -> Self {
        Self { round_cap: DEFAULT_ROUND_CAP }
    }

    /// Sets the number of rounds after which a trial is reported as
    /// [`RaceError::LoopBoundExceeded`].
    pub fn with_round_cap(round_cap: u64) -> Self {
        Self { round_cap }
    }
}

impl Default for ContinuousRace {
    fn default() -> Self {
        Self::new()
    }
}

impl Race for ContinuousRace {
    fn name(&self) -> String {
        "Continuous".into()
    }

    fn run(
        &self,
        params: &Parameters,
        rng: &mut dyn RandomSource,
    ) -> Result<TrialOutcome, RaceError> {
        params.validate()?;

        let sampler = IntervalSampler::new(params.mean_interval);
        let (alpha, beta) = (params.alpha(), params.beta);
        let deadline = params.time_budget;
        let rounds_needed = u64::from(params.depth) - 1;

        let mut attacker_clock = sampler.sample(beta, rng)?;
        if attacker_clock > deadline {
            return Ok(TrialOutcome::loss(deadline, 1));
        }

        let mut honest_clock = 0.0;
        for round in 1..=self.round_cap {
            honest_clock += sampler.sample(alpha, rng)?;
            attacker_clock += sampler.sample(beta, rng)?;

            if attacker_clock > deadline {
                return Ok(TrialOutcome::loss(deadline, round + 1));
            }

            if round >= rounds_needed && attacker_clock <= honest_clock {
                return Ok(TrialOutcome::win(attacker_clock, round + 1));
            }
        }

        Err(RaceError::LoopBoundExceeded { race: self.name(), cap: self.round_cap })
    }
}

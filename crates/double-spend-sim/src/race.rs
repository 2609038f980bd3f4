/*!
Policies deciding the outcome of a single double-spend attempt

A race is any type which implements the [`Race`] trait. Each implementation
models the competition between the attacker's private chain and the honest
chain in its own way, and the two built-in policies are deliberately kept
apart so that their estimates can be compared:

- Separate attacker and honest clocks [`continuous::ContinuousRace`]
- One merged block stream routed by hash power
  [`split_stream::SplitStreamRace`]

# Examples
Running one trial of each policy against a seeded stream:

```
use double_spend_sim::prelude::*;

let params = Parameters::new(0.3, 6.0 * 3600.0);
let mut rng = EntropyStream::from_seed_stream(1, 0);

for race in [Box::new(ContinuousRace::new()) as Box<dyn Race>, Box::new(SplitStreamRace::new())] {
    let outcome = race.run(&params, &mut rng).unwrap();
    assert!(outcome.finish_time <= params.time_budget);
}
```
*/

use std::fmt::Debug;

use crate::{
    params::{ParameterError, Parameters},
    rng::{EntropyError, RandomSource},
};

pub mod continuous;
pub mod split_stream;

pub use continuous::ContinuousRace;
pub use split_stream::SplitStreamRace;

/// Number of loop iterations after which a trial is abandoned as a bug.
///
/// Trials end almost surely because the attacker's clock eventually passes
/// the deadline. At the default block interval this cap allows time budgets
/// of well over a century.
pub const DEFAULT_ROUND_CAP: u64 = 10_000_000;

/// Result of a single trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialOutcome {
    /// Whether the attacker's chain overtook the honest chain in time.
    pub won: bool,
    /// Time at which the attacker won, or the deadline if it lost.
    pub finish_time: f64,
    /// Blocks on the attacker's chain when the trial ended.
    pub attacker_height: u64,
}

impl TrialOutcome {
    pub fn win(finish_time: f64, attacker_height: u64) -> Self {
        Self { won: true, finish_time, attacker_height }
    }

    pub fn loss(deadline: f64, attacker_height: u64) -> Self {
        Self { won: false, finish_time: deadline, attacker_height }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error("invalid trial parameters")]
    InvalidParameter(#[from] ParameterError),
    #[error("random source could not supply a draw")]
    RandomSourceExhausted(#[from] EntropyError),
    #[error("{race} race did not finish within {cap} rounds")]
    LoopBoundExceeded { race: String, cap: u64 },
}

/// Defines how one trial of the double-spend race is played out.
pub trait Race: Debug + dyn_clone::DynClone + Send + Sync {
    /// Returns the name of this policy.
    ///
    /// The return value of this method appears in the "Race" column of
    /// [`ResultsTable`](crate::results::ResultsTable).
    fn name(&self) -> String;

    /// Plays out one trial, drawing all randomness from `rng`.
    ///
    /// Fails with [`RaceError::InvalidParameter`] before drawing anything if
    /// `params` does not pass [`Parameters::validate`].
    fn run(
        &self,
        params: &Parameters,
        rng: &mut dyn RandomSource,
    ) -> Result<TrialOutcome, RaceError>;
}

dyn_clone::clone_trait_object!(Race);

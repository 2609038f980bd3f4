use std::num::NonZeroUsize;

use crate::{
    race::Race,
    rng::{entropy_seed, EntropyError},
};

use super::Simulation;

/// Number of trials sharing one random stream when none is given.
pub const DEFAULT_BATCH_SIZE: usize = 1 << 16;

/// Builds a [`Simulation`].
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    pub batch_size: Option<usize>,
    pub seed: Option<u64>,
    pub trials: Option<usize>,
    race: Option<Box<dyn Race>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationBuildError {
    #[error("no race policy was given")]
    NoRaceGiven,
    #[error("number of trials must be greater than 0")]
    ZeroTrials,
    #[error("batch size must be greater than 0")]
    ZeroBatchSize,
    #[error("could not draw a seed from the operating system")]
    SeedUnavailable(#[from] EntropyError),
}

impl SimulationBuilder {
    /// Creates a new [`SimulationBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Play every trial using `race`.
    pub fn race<R: Race + 'static>(self, race: R) -> Self {
        self.boxed_race(Box::new(race))
    }

    /// Equivalent to [`.race()`](Self::race) for an already boxed policy.
    pub fn boxed_race(mut self, race: Box<dyn Race>) -> Self {
        self.race = Some(race);

        self
    }

    /// Sets the number of trials run per scenario (default 1).
    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);

        self
    }

    /// Sets the seed all scenario streams are derived from. A seed is drawn
    /// from the operating system otherwise.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);

        self
    }

    /// Sets how many consecutive trials share one random stream
    /// (default [`DEFAULT_BATCH_SIZE`]). Results for a given seed are only
    /// reproducible under the same batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);

        self
    }

    /// Creates a [`Simulation`] from the specified parameters.
    pub fn build(self) -> Result<Simulation, SimulationBuildError> {
        use SimulationBuildError::*;

        let SimulationBuilder { batch_size, seed, trials, race } = self;

        let race = race.ok_or(NoRaceGiven)?;
        let trials = match trials {
            Some(x) => NonZeroUsize::new(x).ok_or(ZeroTrials)?,
            None => NonZeroUsize::MIN,
        };
        let batch_size = match batch_size {
            Some(x) => NonZeroUsize::new(x).ok_or(ZeroBatchSize)?,
            None => NonZeroUsize::new(DEFAULT_BATCH_SIZE).ok_or(ZeroBatchSize)?,
        };
        let seed = match seed {
            Some(seed) => seed,
            None => entropy_seed()?,
        };

        Ok(Simulation { race, trials, seed, batch_size })
    }
}

//! Inter-arrival times of rate-weighted Poisson block processes

use crate::{
    params::PowerValue,
    rng::{EntropyError, RandomSource},
};

/// Draws the waiting time until a party holding some share of the network's
/// hash power finds its next block.
///
/// A party with share `s` of a network producing one block every
/// `mean_interval` seconds finds blocks as a Poisson process with rate
/// `s / mean_interval`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalSampler {
    mean_interval: f64,
}

impl IntervalSampler {
    pub fn new(mean_interval: f64) -> Self {
        debug_assert!(mean_interval > 0.0, "mean interval must be positive");

        Self { mean_interval }
    }

    pub fn mean_interval(&self) -> f64 {
        self.mean_interval
    }

    /// Returns one inter-arrival time, in seconds, for a party holding
    /// `rate_share` of the hash power.
    #[inline]
    pub fn sample(
        &self,
        rate_share: PowerValue,
        rng: &mut dyn RandomSource,
    ) -> Result<f64, EntropyError> {
        rng.exponential(rate_share / self.mean_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::IntervalSampler;
    use crate::rng::{
        testing::{Exhausted, Fixed, Scripted},
        EntropyStream,
    };

    #[test]
    fn weaker_party_waits_longer() {
        let sampler = IntervalSampler::new(600.0);
        let mut stream = EntropyStream::from_seed_stream(11, 0);
        let n = 100_000;

        let mut mean = |share| {
            (0..n).map(|_| sampler.sample(share, &mut stream).unwrap()).sum::<f64>()
                / n as f64
        };

        let weak = mean(0.1);
        let strong = mean(0.9);

        assert!((weak / 6000.0 - 1.0).abs() < 0.03, "weak mean {}", weak);
        assert!((strong / (600.0 / 0.9) - 1.0).abs() < 0.03, "strong mean {}", strong);
    }

    #[test]
    fn samples_are_strictly_positive() {
        let sampler = IntervalSampler::new(600.0);
        let mut stream = EntropyStream::from_seed_stream(3, 9);

        assert!((0..10_000).all(|_| sampler.sample(0.5, &mut stream).unwrap() > 0.0));
    }

    #[test]
    fn inverts_uniform_draws() {
        let sampler = IntervalSampler::new(600.0);
        let expected = -(0.5f64).ln() * 600.0 / 0.25;

        let x = sampler.sample(0.25, &mut Fixed(0.5)).unwrap();
        assert!((x - expected).abs() < 1e-9);
    }

    #[test]
    fn degenerate_uniform_draws_never_give_zero_wait() {
        let sampler = IntervalSampler::new(600.0);

        assert_eq!(sampler.sample(0.25, &mut Fixed(0.0)).unwrap(), f64::INFINITY);
        assert!(sampler.sample(0.25, &mut Fixed(f64::MIN_POSITIVE)).unwrap() > 0.0);
        assert!(sampler.sample(0.25, &mut Fixed(1.0 - f64::EPSILON)).unwrap() > 0.0);
    }

    #[test]
    fn propagates_exhaustion() {
        let sampler = IntervalSampler::new(600.0);

        assert!(sampler.sample(0.3, &mut Exhausted).is_err());
        assert!(sampler.sample(0.3, &mut Scripted::default()).is_err());
    }
}

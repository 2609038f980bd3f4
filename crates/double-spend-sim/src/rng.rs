/*!
Sources of randomness for simulations

Races never reach for a global generator. Each trial is handed a
[`RandomSource`], which in production is an [`EntropyStream`] owned by a
single worker for the lifetime of its batch of trials. Tests substitute
scripted sources to drive races through known traces.
*/

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Error produced when a [`RandomSource`] cannot supply another draw.
pub type EntropyError = rand::Error;

/// Capability producing uniform draws, from which all other sampling used by
/// the simulator is derived.
pub trait RandomSource {
    /// Returns a value drawn uniformly from the open interval `(0.0, 1.0)`.
    fn uniform(&mut self) -> Result<f64, EntropyError>;

    /// Returns a value drawn from the exponential distribution with the given
    /// rate, using inversion of one uniform draw.
    ///
    /// The result is strictly positive for any draw below `1.0`, and a draw
    /// of exactly `0.0` gives an infinite wait.
    fn exponential(&mut self, rate: f64) -> Result<f64, EntropyError> {
        debug_assert!(rate > 0.0, "exponential rate must be positive");

        let u = self.uniform()?;
        Ok(-u.ln() / rate)
    }

    /// Returns `true` with probability `p`.
    fn bernoulli(&mut self, p: f64) -> Result<bool, EntropyError> {
        Ok(self.uniform()? < p)
    }
}

/// A long-lived [`RandomSource`] backed by any [`RngCore`] generator.
///
/// Failures reported by the generator through
/// [`RngCore::try_fill_bytes`] are surfaced instead of being papered over.
#[derive(Debug, Clone)]
pub struct EntropyStream<R = ChaCha8Rng> {
    rng: R,
}

impl<R: RngCore> EntropyStream<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl EntropyStream<ChaCha8Rng> {
    /// Creates stream `stream` of the ChaCha8 generator keyed by `seed`.
    /// Distinct stream ids under one key never overlap.
    pub fn from_seed_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);

        Self { rng }
    }
}

impl<R: RngCore> RandomSource for EntropyStream<R> {
    fn uniform(&mut self) -> Result<f64, EntropyError> {
        let mut bytes = [0u8; 8];
        self.rng.try_fill_bytes(&mut bytes)?;

        // midpoints of the 2^52 cells of [0, 1), so never 0 or 1
        let bits = u64::from_le_bytes(bytes) >> 12;
        Ok((bits as f64 + 0.5) * (1.0 / (1u64 << 52) as f64))
    }
}

/// Draws a fresh simulation seed from the operating system.
pub fn entropy_seed() -> Result<u64, EntropyError> {
    let mut bytes = [0u8; 8];
    rand::rngs::OsRng.try_fill_bytes(&mut bytes)?;

    Ok(u64::from_le_bytes(bytes))
}

/// Derives the key of a scenario's generators from a simulation seed and the
/// scenario's parameters, so that every scenario of a sweep draws from
/// unrelated streams while remaining reproducible on its own.
pub(crate) fn scenario_key(seed: u64, params: &crate::params::Parameters) -> u64 {
    let mut key = seed;
    for word in [
        params.beta.to_bits(),
        params.mean_interval.to_bits(),
        u64::from(params.depth),
        params.time_budget.to_bits(),
    ] {
        key = splitmix64(key ^ word);
    }

    key
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

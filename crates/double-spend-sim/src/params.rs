//! Describing a single attack scenario

/// Numeric type used to represent a share of the network's hash power.
pub type PowerValue = f64;

/// Mean block interval used when none is given, in seconds.
pub const DEFAULT_MEAN_INTERVAL: f64 = 600.0;

/// Number of blocks the attacker must produce when none is given.
pub const DEFAULT_DEPTH: u32 = 6;

/// The fixed parameters of one attack scenario.
///
/// All times are in seconds. The honest share of hash power is always
/// `1.0 - beta`, see [`Parameters::alpha`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// Attacker share of the network's hash power, in `(0.0, 1.0)`.
    pub beta: PowerValue,
    /// Mean interval between blocks of the whole network.
    pub mean_interval: f64,
    /// Confirmation depth the attacker's chain must reach.
    pub depth: u32,
    /// Deadline after which the attack is abandoned.
    pub time_budget: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("attacker power {0} is not in the range 0.0..1.0 (exclusive)")]
    BadPowerValue(PowerValue),
    #[error("mean block interval {0} is not a positive, finite number")]
    BadMeanInterval(f64),
    #[error("confirmation depth must be at least 1")]
    ZeroDepth,
    #[error("time budget {0} is not a non-negative, finite number")]
    BadTimeBudget(f64),
}

impl Parameters {
    /// Creates a scenario with the default mean interval and depth.
    pub fn new(beta: PowerValue, time_budget: f64) -> Self {
        Self {
            beta,
            mean_interval: DEFAULT_MEAN_INTERVAL,
            depth: DEFAULT_DEPTH,
            time_budget,
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

    pub fn with_time_budget(mut self, time_budget: f64) -> Self {
        self.time_budget = time_budget;

        self
    }

    /// Honest share of the network's hash power.
    #[inline]
    pub fn alpha(&self) -> PowerValue {
        1.0 - self.beta
    }

    /// Returns true if these parameters describe a scenario that can be
    /// simulated.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks every field of this scenario.
    ///
    /// A time budget of exactly `0.0` is accepted: the deadline has already
    /// passed, so every trial is lost.
    pub fn validate(&self) -> Result<(), ParameterError> {
        use ParameterError::*;

        if self.beta.is_nan() || self.beta <= 0.0 || self.beta >= 1.0 {
            return Err(BadPowerValue(self.beta));
        }

        if !self.mean_interval.is_finite() || self.mean_interval <= 0.0 {
            return Err(BadMeanInterval(self.mean_interval));
        }

        if self.depth == 0 {
            return Err(ZeroDepth);
        }

        if !self.time_budget.is_finite() || self.time_budget < 0.0 {
            return Err(BadTimeBudget(self.time_budget));
        }

        Ok(())
    }
}

/// Helper trait for turning integer percentages into hash power values.
/// # Example
/// ```
/// use double_spend_sim::params::Percent;
///
/// let betas: Vec<_> = (10..=45).step_by(5).percent().collect();
/// assert_eq!(betas.len(), 8);
/// ```
pub trait Percent {
    /// Returns an iterator over percentage values. Can be used with
    /// [`ScenarioSweep`](crate::sweep::ScenarioSweep) to describe the
    /// attacker powers of a sweep.
    fn percent(self) -> impl Iterator<Item = PowerValue>;
}

impl<I> Percent for I
where
    I: Iterator<Item = usize>,
{
    fn percent(self) -> impl Iterator<Item = PowerValue> {
        self.map(|n| {
            assert!(n <= 100, "invalid percent value {}", n);
            n as PowerValue / 100.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ParameterError, Parameters, Percent};

    #[test]
    fn defaults_match_sweep_programs() {
        let params = Parameters::new(0.3, 3600.0);

        assert_eq!(params.mean_interval, 600.0);
        assert_eq!(params.depth, 6);
        assert!(params.is_valid());
        assert!((params.alpha() + params.beta - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_power() {
        for beta in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                Parameters::new(beta, 3600.0).validate(),
                Err(ParameterError::BadPowerValue(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_interval_depth_and_budget() {
        let params = Parameters::new(0.3, 3600.0);

        assert_eq!(
            params.with_mean_interval(0.0).validate(),
            Err(ParameterError::BadMeanInterval(0.0))
        );
        assert_eq!(params.with_depth(0).validate(), Err(ParameterError::ZeroDepth));
        assert_eq!(
            params.with_time_budget(-1.0).validate(),
            Err(ParameterError::BadTimeBudget(-1.0))
        );
        assert!(params.with_time_budget(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn zero_time_budget_is_valid() {
        assert!(Parameters::new(0.3, 0.0).is_valid());
    }

    #[test]
    fn percent_steps() {
        let betas: Vec<_> = (10..=45).step_by(5).percent().collect();

        assert_eq!(betas, vec![0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45]);
    }
}

//! Arm Statistics - per-arm pull counts and running mean rewards

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Per-arm counts and running reward averages for one experiment.
///
/// `counts` and `values` always have the same length (the arm cardinality),
/// and an arm with a zero count always has a value of `0.0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArmStatistics {
    counts: Vec<u64>,
    values: Vec<f64>,
}

impl ArmStatistics {
    /// Create fully-zeroed statistics for `arms` arms.
    #[must_use]
    pub fn zeroed(arms: usize) -> Self {
        Self {
            counts: vec![0; arms],
            values: vec![0.0; arms],
        }
    }

    /// Warm-start from prior counts and values.
    ///
    /// Values of zero-count arms are reset to `0.0`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the lengths differ or a value is not finite
    pub fn seeded(counts: Vec<u64>, mut values: Vec<f64>) -> Result<Self> {
        if counts.len() != values.len() {
            return Err(Error::InvalidArgument(format!(
                "seed counts ({}) and values ({}) must have the same length",
                counts.len(),
                values.len()
            )));
        }
        if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "seed value for arm {bad} is not finite"
            )));
        }
        for (value, count) in values.iter_mut().zip(&counts) {
            if *count == 0 {
                *value = 0.0;
            }
        }
        Ok(Self { counts, values })
    }

    /// Number of arms.
    #[must_use]
    pub fn arms(&self) -> usize {
        self.counts.len()
    }

    /// Pull counts, indexed by arm.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Running mean rewards, indexed by arm.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Total observations across all arms.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Fail fast on an arm index outside `[0, arms)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an out-of-range index
    pub fn check_arm(&self, arm: usize) -> Result<()> {
        if arm < self.arms() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "arm index {arm} out of range [0, {})",
                self.arms()
            )))
        }
    }

    /// Mutable access to one arm's `(count, value)` pair for update rules.
    pub(crate) fn arm_mut(&mut self, arm: usize) -> Result<(&mut u64, &mut f64)> {
        self.check_arm(arm)?;
        Ok((&mut self.counts[arm], &mut self.values[arm]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let stats = ArmStatistics::zeroed(3);
        assert_eq!(stats.arms(), 3);
        assert_eq!(stats.counts(), &[0, 0, 0]);
        assert_eq!(stats.values(), &[0.0, 0.0, 0.0]);
        assert_eq!(stats.total_count(), 0);
    }

    #[test]
    fn test_seeded_keeps_data() {
        let stats = ArmStatistics::seeded(vec![4, 1], vec![0.25, 1.0]).unwrap();
        assert_eq!(stats.counts(), &[4, 1]);
        assert_eq!(stats.values(), &[0.25, 1.0]);
        assert_eq!(stats.total_count(), 5);
    }

    #[test]
    fn test_seeded_resets_value_of_unpulled_arm() {
        let stats = ArmStatistics::seeded(vec![0, 2], vec![0.9, 0.5]).unwrap();
        assert_eq!(stats.values(), &[0.0, 0.5]);
    }

    #[test]
    fn test_seeded_length_mismatch() {
        let err = ArmStatistics::seeded(vec![1, 2], vec![0.5]);
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_seeded_rejects_nan() {
        let err = ArmStatistics::seeded(vec![1], vec![f64::NAN]);
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_check_arm_bounds() {
        let stats = ArmStatistics::zeroed(2);
        assert!(stats.check_arm(0).is_ok());
        assert!(stats.check_arm(1).is_ok());
        assert!(matches!(stats.check_arm(2), Err(Error::InvalidArgument(_))));
    }
}

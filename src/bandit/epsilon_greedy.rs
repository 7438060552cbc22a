//! Epsilon-greedy arm selection
//!
//! Exploits the best-known arm with probability `1 - epsilon` and explores a
//! uniformly random arm otherwise. Rewards fold into a running mean in O(1):
//!
//! ```text
//! n     = counts[arm] + 1
//! value = (value * (n - 1) + reward) / n
//! ```
//!
//! which equals the arithmetic mean of every reward seen for the arm without
//! keeping the history around.

use super::{ArmStatistics, Decision, RandomSource, Strategy};
use crate::{Error, Result};

/// Epsilon-greedy policy parameterised by its exploration probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    /// Create a policy exploring with probability `epsilon`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `epsilon` is outside `[0, 1]` or NaN
    pub fn new(epsilon: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(Error::InvalidArgument(format!(
                "epsilon must be in [0, 1], got {epsilon}"
            )));
        }
        Ok(Self { epsilon })
    }

    /// The exploration probability.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

/// Index of the highest value; ties resolve to the lowest index.
#[must_use]
pub fn best_arm(values: &[f64]) -> usize {
    let mut best = 0;
    for (arm, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = arm;
        }
    }
    best
}

impl Strategy for EpsilonGreedy {
    fn decide(&self, statistics: &ArmStatistics, random: &dyn RandomSource) -> Result<Decision> {
        if statistics.arms() == 0 {
            return Err(Error::InvalidArgument(
                "cannot select an arm from a zero-arm experiment".to_string(),
            ));
        }

        let u = random.next_f64();
        if u > self.epsilon {
            Ok(Decision {
                arm: best_arm(statistics.values()),
                exploit: true,
            })
        } else {
            Ok(Decision {
                arm: random.next_index(statistics.arms()),
                exploit: false,
            })
        }
    }

    fn apply_reward(&self, statistics: &mut ArmStatistics, arm: usize, reward: f64) -> Result<()> {
        if !reward.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "reward must be finite, got {reward}"
            )));
        }
        let (count, value) = statistics.arm_mut(arm)?;
        let next = count.checked_add(1).ok_or_else(|| {
            Error::InvalidArgument(format!("arm {arm} pull count is saturated at {}", u64::MAX))
        })?;
        *count = next;
        #[allow(clippy::cast_precision_loss)]
        let n = next as f64;
        *value = (*value * (n - 1.0) + reward) / n;
        Ok(())
    }
}

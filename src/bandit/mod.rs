//! Bandit decision logic
//!
//! Pure computation over an immutable `ArmStatistics` snapshot: no storage,
//! no locking, no global state.
//!
//! ```rust
//! use trueno_bandit::bandit::{ArmStatistics, EpsilonGreedy, ScriptedRandom, Strategy};
//!
//! let policy = EpsilonGreedy::new(0.1)?;
//! let mut stats = ArmStatistics::zeroed(3);
//! policy.apply_reward(&mut stats, 2, 1.0)?;
//!
//! // A draw above epsilon exploits the best arm
//! let decision = policy.decide(&stats, &ScriptedRandom::new([0.9], []))?;
//! assert_eq!(decision.arm, 2);
//! assert!(decision.exploit);
//! # Ok::<(), trueno_bandit::Error>(())
//! ```

mod epsilon_greedy;
mod random;
mod statistics;

pub use epsilon_greedy::{best_arm, EpsilonGreedy};
pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use statistics::ArmStatistics;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Outcome of one arm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Selected arm index
    pub arm: usize,
    /// `true` when the best-known arm was exploited, `false` when exploring
    pub exploit: bool,
}

/// Capability set every bandit policy provides.
pub trait Strategy: Send + Sync {
    /// Select an arm from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero-arm snapshot
    fn decide(&self, statistics: &ArmStatistics, random: &dyn RandomSource) -> Result<Decision>;

    /// Fold one observed reward for `arm` into the statistics.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `arm` is out of range or the reward is not
    /// finite; the statistics are left untouched in that case
    fn apply_reward(&self, statistics: &mut ArmStatistics, arm: usize, reward: f64) -> Result<()>;
}

/// Policy variant persisted with each experiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Epsilon-greedy (the only variant today)
    #[default]
    EpsilonGreedy,
}

impl StrategyKind {
    /// Get strategy name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EpsilonGreedy => "epsilon_greedy",
        }
    }

    /// Instantiate the policy with the experiment's parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the parameters are invalid for the variant
    pub fn build(self, epsilon: f64) -> Result<Box<dyn Strategy>> {
        match self {
            Self::EpsilonGreedy => Ok(Box::new(EpsilonGreedy::new(epsilon)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_default() {
        assert_eq!(StrategyKind::default(), StrategyKind::EpsilonGreedy);
        assert_eq!(StrategyKind::EpsilonGreedy.as_str(), "epsilon_greedy");
    }

    #[test]
    fn test_strategy_kind_serde_name() {
        let json = serde_json::to_string(&StrategyKind::EpsilonGreedy).unwrap();
        assert_eq!(json, "\"epsilon_greedy\"");
    }

    #[test]
    fn test_strategy_kind_build() {
        let strategy = StrategyKind::EpsilonGreedy.build(0.0).unwrap();
        let stats = ArmStatistics::seeded(vec![1, 1], vec![0.0, 1.0]).unwrap();
        let decision = strategy.decide(&stats, &ThreadRandom).unwrap();
        assert_eq!(decision, Decision { arm: 1, exploit: true });

        assert!(StrategyKind::EpsilonGreedy.build(2.0).is_err());
    }
}

//! Engine configuration
//!
//! Built with a consuming builder, validated once at `build()`:
//!
//! ```rust
//! use std::time::Duration;
//! use trueno_bandit::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .lock_timeout(Duration::from_millis(250))
//!     .key_prefix("checkout")
//!     .build()?;
//! assert_eq!(config.key_prefix(), "checkout");
//! # Ok::<(), trueno_bandit::Error>(())
//! ```

use std::time::Duration;

use crate::{Error, Result};

/// Default bound on the per-experiment exclusive wait
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Arm count used when a non-positive one is supplied at creation
pub const DEFAULT_ARM_COUNT: usize = 2;

/// Exploration probability used when epsilon is left unset (zero)
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Window during which a client keeps receiving the same decision
pub const DEFAULT_DECISION_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Engine configuration shared by the store and the decision service.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    lock_timeout: Duration,
    default_arm_count: usize,
    default_epsilon: f64,
    key_prefix: String,
    decision_cache_ttl: Option<Duration>,
}

impl EngineConfig {
    /// Create a builder initialised with the defaults.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Bound on how long `update_arm` waits for its experiment's exclusive section.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Arm count substituted for non-positive requests.
    #[must_use]
    pub const fn default_arm_count(&self) -> usize {
        self.default_arm_count
    }

    /// Epsilon substituted for zero-valued requests.
    #[must_use]
    pub const fn default_epsilon(&self) -> f64 {
        self.default_epsilon
    }

    /// Key namespace for persisted records.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Decision cache TTL, `None` when client deduplication is disabled.
    #[must_use]
    pub const fn decision_cache_ttl(&self) -> Option<Duration> {
        self.decision_cache_ttl
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            default_arm_count: DEFAULT_ARM_COUNT,
            default_epsilon: DEFAULT_EPSILON,
            key_prefix: "bandit".to_string(),
            decision_cache_ttl: Some(DEFAULT_DECISION_CACHE_TTL),
        }
    }
}

/// Builder for `EngineConfig`.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the per-experiment lock timeout
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    /// Set the fallback arm count
    #[must_use]
    pub const fn default_arm_count(mut self, arms: usize) -> Self {
        self.config.default_arm_count = arms;
        self
    }

    /// Set the fallback epsilon
    #[must_use]
    pub const fn default_epsilon(mut self, epsilon: f64) -> Self {
        self.config.default_epsilon = epsilon;
        self
    }

    /// Set the key namespace
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Set the decision cache TTL (`None` disables the cache)
    #[must_use]
    pub const fn decision_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.config.decision_cache_ttl = ttl;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the fallback arm count is zero, the fallback
    /// epsilon is outside `(0, 1]`, or the key prefix is empty
    pub fn build(self) -> Result<EngineConfig> {
        let config = self.config;
        if config.default_arm_count == 0 {
            return Err(Error::InvalidArgument(
                "default arm count must be at least 1".to_string(),
            ));
        }
        if !(config.default_epsilon > 0.0 && config.default_epsilon <= 1.0) {
            return Err(Error::InvalidArgument(format!(
                "default epsilon must be in (0, 1], got {}",
                config.default_epsilon
            )));
        }
        if config.key_prefix.is_empty() {
            return Err(Error::InvalidArgument(
                "key prefix must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::builder().build().unwrap();
        assert_eq!(config.lock_timeout(), DEFAULT_LOCK_TIMEOUT);
        assert_eq!(config.default_arm_count(), 2);
        assert!((config.default_epsilon() - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.key_prefix(), "bandit");
        assert_eq!(config.decision_cache_ttl(), Some(DEFAULT_DECISION_CACHE_TTL));
    }

    #[test]
    fn test_builder_overrides() {
        let config = EngineConfig::builder()
            .lock_timeout(Duration::from_millis(10))
            .default_arm_count(4)
            .default_epsilon(0.2)
            .decision_cache_ttl(None)
            .build()
            .unwrap();
        assert_eq!(config.lock_timeout(), Duration::from_millis(10));
        assert_eq!(config.default_arm_count(), 4);
        assert!(config.decision_cache_ttl().is_none());
    }

    #[test]
    fn test_rejects_zero_arm_default() {
        let err = EngineConfig::builder().default_arm_count(0).build();
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_bad_epsilon_default() {
        for eps in [0.0, -0.5, 1.5, f64::NAN] {
            let err = EngineConfig::builder().default_epsilon(eps).build();
            assert!(matches!(err, Err(Error::InvalidArgument(_))), "eps = {eps}");
        }
    }

    #[test]
    fn test_rejects_empty_prefix() {
        let err = EngineConfig::builder().key_prefix("").build();
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }
}

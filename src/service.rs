//! Decision Service - the facade called by transport handlers
//!
//! A decision loop alternates between two calls:
//!
//! ```text
//! select_arm(id)                 → Decision { arm, exploit }   (read-only)
//! record_reward(id, arm, reward) → committed record             (atomic update)
//! ```
//!
//! The arm credited by `record_reward` is whatever the caller passes; it is not
//! checked against an earlier `select_arm`.

use crate::bandit::{Decision, RandomSource, ThreadRandom};
use crate::cache::DecisionCache;
use crate::config::EngineConfig;
use crate::experiment::{ExperimentId, ExperimentRecord, ExperimentStore, NewExperiment};
use crate::kv::KvStore;
use crate::{Error, Result};

/// Facade composing `ExperimentStore`, the policies, and the decision cache.
///
/// # Example
///
/// ```rust
/// use trueno_bandit::config::EngineConfig;
/// use trueno_bandit::experiment::NewExperiment;
/// use trueno_bandit::kv::MemoryKvStore;
/// use trueno_bandit::DecisionService;
///
/// # async fn example() -> trueno_bandit::Result<()> {
/// let service = DecisionService::new(MemoryKvStore::new(), EngineConfig::default());
/// let experiment = service
///     .create_experiment(NewExperiment::builder().arms(3).name("cta-color").build())
///     .await?;
/// let id = experiment.id().to_string();
///
/// let decision = service.select_arm(&id).await?;
/// service.record_reward(&id, decision.arm, 1.0).await?;
/// # Ok(())
/// # }
/// ```
pub struct DecisionService<S: KvStore, R: RandomSource = ThreadRandom> {
    store: ExperimentStore<S>,
    random: R,
    cache: Option<DecisionCache>,
}

impl<S: KvStore> DecisionService<S> {
    /// Create a service drawing from the thread-local generator.
    #[must_use]
    pub fn new(kv: S, config: EngineConfig) -> Self {
        Self::with_random(kv, config, ThreadRandom)
    }
}

impl<S: KvStore, R: RandomSource> DecisionService<S, R> {
    /// Create a service with an explicit random source.
    #[must_use]
    pub fn with_random(kv: S, config: EngineConfig, random: R) -> Self {
        let cache = config.decision_cache_ttl().map(DecisionCache::new);
        Self {
            store: ExperimentStore::new(kv, config),
            random,
            cache,
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &ExperimentStore<S> {
        &self.store
    }

    /// The decision cache, if enabled.
    #[must_use]
    pub const fn cache(&self) -> Option<&DecisionCache> {
        self.cache.as_ref()
    }

    /// Create an experiment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for invalid parameters, or a storage error
    pub async fn create_experiment(&self, request: NewExperiment) -> Result<ExperimentRecord> {
        self.store.create(request).await
    }

    /// Load an experiment by its string id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed id, `NotFound` if absent
    pub async fn get_experiment(&self, id: &str) -> Result<ExperimentRecord> {
        self.store.get(&id.parse()?).await
    }

    /// All experiments, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a record cannot be read
    pub async fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        self.store.list().await
    }

    /// Decide which arm to offer next.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed id, `NotFound` if absent
    pub async fn select_arm(&self, id: &str) -> Result<Decision> {
        self.store.select_arm(&id.parse()?, &self.random).await
    }

    /// Decide for `client`, reusing its live cached decision if there is one.
    ///
    /// A cached decision is only returned while its experiment still exists;
    /// a decision cached by a read that raced a delete is evicted instead.
    /// Falls back to `select_arm` when the cache is disabled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed id, `NotFound` if absent
    pub async fn select_arm_for_client(&self, id: &str, client: &str) -> Result<Decision> {
        let id: ExperimentId = id.parse()?;
        let Some(cache) = &self.cache else {
            return self.store.select_arm(&id, &self.random).await;
        };
        if let Some(decision) = cache.get(&id, client) {
            if !self.store.exists(&id).await? {
                cache.evict_experiment(&id);
                tracing::debug!(experiment_id = %id, client, "stale cached decision evicted");
                return Err(Error::NotFound(id.to_string()));
            }
            tracing::debug!(experiment_id = %id, client, arm = decision.arm, "cached decision reused");
            return Ok(decision);
        }
        let decision = self.store.select_arm(&id, &self.random).await?;
        cache.insert(id, client, decision);
        Ok(decision)
    }

    /// Record an observed reward for `arm`. Returns the committed record.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a malformed id, out-of-range arm, or non-finite reward
    /// - `NotFound` if absent
    /// - `Timeout` if the experiment is too contended (retryable)
    pub async fn record_reward(&self, id: &str, arm: usize, reward: f64) -> Result<ExperimentRecord> {
        self.store.update_arm(&id.parse()?, arm, reward).await
    }

    /// Delete an experiment and forget its cached decisions.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed id, `NotFound` if absent
    pub async fn delete_experiment(&self, id: &str) -> Result<()> {
        let id: ExperimentId = id.parse()?;
        self.store.delete(&id).await?;
        if let Some(cache) = &self.cache {
            cache.evict_experiment(&id);
        }
        Ok(())
    }

    /// Sweep expired cached decisions. Returns how many were dropped.
    ///
    /// Meant to be driven by an external periodic job.
    pub fn purge_expired_decisions(&self) -> usize {
        self.cache.as_ref().map_or(0, DecisionCache::purge_expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::ScriptedRandom;
    use crate::kv::MemoryKvStore;

    #[tokio::test]
    async fn test_malformed_id_rejected_everywhere() {
        let service = DecisionService::new(MemoryKvStore::new(), EngineConfig::default());
        assert!(matches!(service.get_experiment("nope").await, Err(Error::InvalidArgument(_))));
        assert!(matches!(service.select_arm("nope").await, Err(Error::InvalidArgument(_))));
        assert!(matches!(
            service.record_reward("nope", 0, 1.0).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(service.delete_experiment("nope").await, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_client_decision_reused() {
        // First draw explores arm 2, every later draw would exploit arm 0
        let random = ScriptedRandom::new([0.0, 0.9, 0.9], [2]);
        let service = DecisionService::with_random(MemoryKvStore::new(), EngineConfig::default(), random);
        let id = service
            .create_experiment(NewExperiment::builder().arms(3).build())
            .await
            .unwrap()
            .id()
            .to_string();

        let first = service.select_arm_for_client(&id, "user-7").await.unwrap();
        let again = service.select_arm_for_client(&id, "user-7").await.unwrap();
        let other = service.select_arm_for_client(&id, "user-8").await.unwrap();

        assert_eq!(first, Decision { arm: 2, exploit: false });
        assert_eq!(again, first);
        assert_eq!(other, Decision { arm: 0, exploit: true });
    }

    #[tokio::test]
    async fn test_cache_disabled_decides_fresh() {
        let config = EngineConfig::builder().decision_cache_ttl(None).build().unwrap();
        let random = ScriptedRandom::new([0.0, 0.9], [1]);
        let service = DecisionService::with_random(MemoryKvStore::new(), config, random);
        let id = service
            .create_experiment(NewExperiment::builder().arms(2).build())
            .await
            .unwrap()
            .id()
            .to_string();

        assert!(service.cache().is_none());
        let first = service.select_arm_for_client(&id, "u").await.unwrap();
        let second = service.select_arm_for_client(&id, "u").await.unwrap();
        assert_eq!(first, Decision { arm: 1, exploit: false });
        assert_eq!(second, Decision { arm: 0, exploit: true });
        assert_eq!(service.purge_expired_decisions(), 0);
    }

    #[tokio::test]
    async fn test_delete_evicts_cached_decisions() {
        let service = DecisionService::new(MemoryKvStore::new(), EngineConfig::default());
        let id = service
            .create_experiment(NewExperiment::default())
            .await
            .unwrap()
            .id()
            .to_string();

        service.select_arm_for_client(&id, "u").await.unwrap();
        service.delete_experiment(&id).await.unwrap();

        assert!(service.cache().unwrap().is_empty());
        assert!(matches!(
            service.select_arm_for_client(&id, "u").await,
            Err(Error::NotFound(_))
        ));
    }
}

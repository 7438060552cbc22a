//! Decision cache: per-client deduplication of arm selections
//!
//! A client that asks again for the same experiment within the TTL window
//! gets the decision it already received instead of a fresh draw, so one user
//! keeps seeing one variant. Not required for correctness: a miss just means
//! a fresh decision.

use std::time::Duration;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use tokio::time::Instant;
use trueno::hash_key;

use crate::bandit::Decision;
use crate::experiment::ExperimentId;

#[derive(Debug, Clone)]
struct CachedDecision {
    experiment_id: ExperimentId,
    client: String,
    decision: Decision,
    decided_at: Instant,
}

/// TTL-bounded map from `(experiment, client)` to the decision handed out.
#[derive(Debug)]
pub struct DecisionCache {
    ttl: Duration,
    entries: DashMap<u64, CachedDecision, FxBuildHasher>,
}

impl DecisionCache {
    /// Create an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn cache_key(experiment_id: &ExperimentId, client: &str) -> u64 {
        hash_key(&format!("{experiment_id}/{client}"))
    }

    /// The live decision previously given to `client`, if any.
    #[must_use]
    pub fn get(&self, experiment_id: &ExperimentId, client: &str) -> Option<Decision> {
        let key = Self::cache_key(experiment_id, client);
        let entry = self.entries.get(&key)?;
        if entry.experiment_id != *experiment_id || entry.client != client {
            return None;
        }
        if entry.decided_at.elapsed() >= self.ttl {
            drop(entry);
            self.entries
                .remove_if(&key, |_, cached| cached.decided_at.elapsed() >= self.ttl);
            return None;
        }
        Some(entry.decision)
    }

    /// Remember `decision` for `client`.
    pub fn insert(&self, experiment_id: ExperimentId, client: &str, decision: Decision) {
        self.entries.insert(
            Self::cache_key(&experiment_id, client),
            CachedDecision {
                experiment_id,
                client: client.to_string(),
                decision,
                decided_at: Instant::now(),
            },
        );
    }

    /// Drop every entry for `experiment_id`. Returns how many were removed.
    pub fn evict_experiment(&self, experiment_id: &ExperimentId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, cached| cached.experiment_id != *experiment_id);
        before.saturating_sub(self.entries.len())
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, cached| cached.decided_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of cached entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPLOIT_0: Decision = Decision { arm: 0, exploit: true };
    const EXPLORE_2: Decision = Decision { arm: 2, exploit: false };

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl_then_expire() {
        let cache = DecisionCache::new(Duration::from_secs(60));
        let id = ExperimentId::new();

        cache.insert(id, "user-1", EXPLORE_2);
        assert_eq!(cache.get(&id, "user-1"), Some(EXPLORE_2));
        assert_eq!(cache.get(&id, "user-2"), None);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get(&id, "user-1"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = DecisionCache::new(Duration::from_secs(10));
        let id = ExperimentId::new();

        cache.insert(id, "old", EXPLOIT_0);
        tokio::time::advance(Duration::from_secs(11)).await;
        cache.insert(id, "fresh", EXPLOIT_0);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&id, "fresh"), Some(EXPLOIT_0));
    }

    #[tokio::test]
    async fn test_evict_experiment() {
        let cache = DecisionCache::new(Duration::from_secs(60));
        let a = ExperimentId::new();
        let b = ExperimentId::new();

        cache.insert(a, "u1", EXPLOIT_0);
        cache.insert(a, "u2", EXPLORE_2);
        cache.insert(b, "u1", EXPLOIT_0);

        assert_eq!(cache.evict_experiment(&a), 2);
        assert_eq!(cache.get(&a, "u1"), None);
        assert_eq!(cache.get(&b, "u1"), Some(EXPLOIT_0));
    }
}

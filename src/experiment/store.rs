//! Experiment Store - the transactional boundary around experiment records
//!
//! ## Update discipline
//!
//! Rewards are folded in with one atomic read-modify-write per call:
//!
//! ```text
//! acquire per-experiment lock (bounded by lock_timeout)
//!   └─ KvStore::transaction(key)
//!        load record → validate arm → apply_reward → touch → write back
//! release lock
//! ```
//!
//! The running mean depends on the *current* count, so a stale read under a
//! concurrent writer would silently drop an observation. The per-experiment
//! lock serialises updates to one experiment no matter how the backend
//! implements transactions; updates to different experiments use different
//! locks and never wait on each other. Nothing outside `update_arm` writes a
//! record after creation.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use tokio::sync::Mutex;

use super::{ExperimentId, ExperimentRecord, NewExperiment};
use crate::bandit::{Decision, RandomSource};
use crate::config::EngineConfig;
use crate::kv::{KvStore, TxOp};
use crate::{Error, Result};

type LockTable = DashMap<ExperimentId, Arc<Mutex<()>>, FxBuildHasher>;

/// Holds a handle on one experiment's lock; drops the table entry once idle.
struct LockLease<'a> {
    table: &'a LockTable,
    id: ExperimentId,
    lock: Arc<Mutex<()>>,
}

impl<'a> LockLease<'a> {
    fn acquire(table: &'a LockTable, id: ExperimentId) -> Self {
        let lock = Arc::clone(table.entry(id).or_default().value());
        Self { table, id, lock }
    }
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        // Only the table's handle and ours left: nobody else holds or waits on it
        self.table
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 2);
    }
}

/// Transactional store for experiment records, keyed `"{prefix}:{id}"`.
///
/// # Example
///
/// ```rust
/// use trueno_bandit::experiment::{ExperimentStore, NewExperiment};
/// use trueno_bandit::kv::MemoryKvStore;
///
/// # async fn example() -> trueno_bandit::Result<()> {
/// let store = ExperimentStore::with_defaults(MemoryKvStore::new());
/// let record = store.create(NewExperiment::builder().arms(3).build()).await?;
///
/// store.update_arm(&record.id(), 0, 1.0).await?;
/// let record = store.get(&record.id()).await?;
/// assert_eq!(record.counts(), &[1, 0, 0]);
/// # Ok(())
/// # }
/// ```
pub struct ExperimentStore<S: KvStore> {
    kv: S,
    config: EngineConfig,
    locks: LockTable,
}

impl<S: KvStore> ExperimentStore<S> {
    /// Create a store over `kv` with the given configuration.
    #[must_use]
    pub fn new(kv: S, config: EngineConfig) -> Self {
        Self {
            kv,
            config,
            locks: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Create a store over `kv` with the default configuration.
    #[must_use]
    pub fn with_defaults(kv: S) -> Self {
        Self::new(kv, EngineConfig::default())
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying key-value store (for inspection/testing).
    #[must_use]
    pub const fn kv(&self) -> &S {
        &self.kv
    }

    fn key(&self, id: &ExperimentId) -> String {
        format!("{}:{id}", self.config.key_prefix())
    }

    /// Normalise `request`, assign an id and timestamps, and persist it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for invalid parameters, or a storage error
    pub async fn create(&self, request: NewExperiment) -> Result<ExperimentRecord> {
        let record = request.into_record(&self.config)?;
        let encoded = serde_json::to_vec(&record)?;
        let id = record.id();

        self.kv
            .transaction(&self.key(&id), |current| {
                if current.is_some() {
                    return Err(Error::StorageError(format!(
                        "experiment id {id} already in use"
                    )));
                }
                Ok((TxOp::Put(encoded), ()))
            })
            .await?;

        tracing::info!(
            experiment_id = %id,
            arm_count = record.arm_count(),
            epsilon = record.epsilon(),
            strategy = record.strategy().as_str(),
            "experiment created"
        );
        Ok(record)
    }

    /// Load a record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, or a storage error for a corrupt record
    pub async fn get(&self, id: &ExperimentId) -> Result<ExperimentRecord> {
        match self.kv.get(&self.key(id)).await? {
            Some(bytes) => decode(id, &bytes),
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    /// All records under this store's prefix, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any listed record cannot be read
    pub async fn list(&self) -> Result<Vec<ExperimentRecord>> {
        let prefix = format!("{}:", self.config.key_prefix());
        let keys = self.kv.keys(&prefix).await?;
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let values = self.kv.batch_get(&key_refs).await?;

        let mut records = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            // Deleted between listing and loading
            let Some(bytes) = value else { continue };
            let id: ExperimentId = key[prefix.len()..].parse().map_err(|_| {
                Error::StorageError(format!("unexpected key {key:?} under {prefix:?}"))
            })?;
            records.push(decode(&id, &bytes)?);
        }
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(records)
    }

    /// Whether a record is currently stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails
    pub async fn exists(&self, id: &ExperimentId) -> Result<bool> {
        self.kv.exists(&self.key(id)).await
    }

    /// Permanently remove a record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, or a storage error
    pub async fn delete(&self, id: &ExperimentId) -> Result<()> {
        self.kv
            .transaction(&self.key(id), |current| match current {
                Some(_) => Ok((TxOp::Delete, ())),
                None => Err(Error::NotFound(id.to_string())),
            })
            .await?;
        tracing::info!(experiment_id = %id, "experiment deleted");
        Ok(())
    }

    /// Decide which arm to offer next from the current snapshot.
    ///
    /// Read-only: no lock is taken, the decision is a pure function of the
    /// snapshot observed by the read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, or a storage error
    pub async fn select_arm(
        &self,
        id: &ExperimentId,
        random: &dyn RandomSource,
    ) -> Result<Decision> {
        let record = self.get(id).await?;
        let decision = record
            .strategy()
            .build(record.epsilon())?
            .decide(record.statistics(), random)?;
        tracing::debug!(
            experiment_id = %id,
            arm = decision.arm,
            exploit = decision.exploit,
            "arm selected"
        );
        Ok(decision)
    }

    /// Fold `reward` for `arm` into the experiment, atomically.
    ///
    /// Returns the committed record.
    ///
    /// # Errors
    ///
    /// - `Timeout` if the experiment's lock is not acquired within `lock_timeout`
    /// - `NotFound` if the record is absent when read
    /// - `InvalidArgument` if `arm` is outside `[0, arm_count)` or `reward` is not finite
    ///
    /// On any error the stored record is unchanged.
    pub async fn update_arm(
        &self,
        id: &ExperimentId,
        arm: usize,
        reward: f64,
    ) -> Result<ExperimentRecord> {
        let lease = LockLease::acquire(&self.locks, *id);
        let timeout = self.config.lock_timeout();
        let Ok(_guard) = tokio::time::timeout(timeout, Arc::clone(&lease.lock).lock_owned()).await else {
            tracing::warn!(
                experiment_id = %id,
                timeout = ?timeout,
                "lock wait timed out"
            );
            return Err(Error::Timeout {
                experiment_id: id.to_string(),
                waited_ms: timeout.as_millis(),
            });
        };

        let record = self
            .kv
            .transaction(&self.key(id), |current| {
                let bytes = current.ok_or_else(|| Error::NotFound(id.to_string()))?;
                let mut record = decode(id, bytes)?;
                record
                    .strategy()
                    .build(record.epsilon())?
                    .apply_reward(record.statistics_mut(), arm, reward)?;
                record.touch();
                Ok((TxOp::Put(serde_json::to_vec(&record)?), record))
            })
            .await?;

        tracing::debug!(
            experiment_id = %id,
            arm,
            reward,
            count = record.counts()[arm],
            value = record.values()[arm],
            "reward recorded"
        );
        Ok(record)
    }

    /// Number of experiments with an update in flight or waiting.
    #[must_use]
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }
}

fn decode(id: &ExperimentId, bytes: &[u8]) -> Result<ExperimentRecord> {
    let record: ExperimentRecord = serde_json::from_slice(bytes).map_err(|e| {
        tracing::warn!(experiment_id = %id, error = %e, "corrupt experiment record");
        Error::StorageError(format!("corrupt record {id}: {e}"))
    })?;
    record.check_consistency()?;
    Ok(record)
}

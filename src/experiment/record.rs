//! Experiment Record - the unit of persistence and of transactional update

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bandit::{ArmStatistics, StrategyKind};
use crate::config::EngineConfig;
use crate::{Error, Result};

/// Upper bound on arms per experiment
pub const MAX_ARMS: usize = 1 << 16;

/// Opaque experiment identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentId(Uuid);

impl ExperimentId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExperimentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ExperimentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::InvalidArgument(format!("malformed experiment id {s:?}: {e}")))
    }
}

/// Descriptive fields carried with an experiment. Never interpreted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentMetadata {
    /// Human-readable name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Labels of the features under test
    pub features: Vec<String>,
    /// Additional free-form fields
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// Experiment Record: identity, configuration, and arm statistics.
///
/// Persisted as `{id, arm_count, epsilon, strategy, counts, values,
/// created_at, updated_at, metadata}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    id: ExperimentId,
    arm_count: usize,
    epsilon: f64,
    #[serde(default)]
    strategy: StrategyKind,
    #[serde(flatten)]
    statistics: ArmStatistics,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    metadata: ExperimentMetadata,
}

impl ExperimentRecord {
    /// Get the experiment ID.
    #[must_use]
    pub const fn id(&self) -> ExperimentId {
        self.id
    }

    /// Number of arms (fixed for the experiment's lifetime).
    #[must_use]
    pub const fn arm_count(&self) -> usize {
        self.arm_count
    }

    /// Exploration probability.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Policy variant.
    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Current arm statistics.
    #[must_use]
    pub const fn statistics(&self) -> &ArmStatistics {
        &self.statistics
    }

    /// Pull counts, indexed by arm.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        self.statistics.counts()
    }

    /// Running mean rewards, indexed by arm.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        self.statistics.values()
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the last committed update.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Descriptive metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ExperimentMetadata {
        &self.metadata
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut ArmStatistics {
        &mut self.statistics
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }

    /// Reject records whose shape contradicts their own configuration.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        let counts = self.statistics.counts().len();
        let values = self.statistics.values().len();
        if self.arm_count == 0 || counts != self.arm_count || values != self.arm_count {
            return Err(Error::StorageError(format!(
                "corrupt record {}: arm_count {} but {counts} counts and {values} values",
                self.id, self.arm_count
            )));
        }
        Ok(())
    }
}

/// Creation request for an experiment.
///
/// Mirrors what transport handlers receive: a non-positive `arm_count` and a
/// zero `epsilon` mean "use the configured default". Seed `counts`/`values`
/// warm-start the statistics; if either length differs from the arm count
/// both are discarded and the statistics start zeroed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewExperiment {
    /// Requested arm count
    pub arm_count: i64,
    /// Requested exploration probability
    pub epsilon: f64,
    /// Policy variant
    pub strategy: StrategyKind,
    /// Optional seed counts
    pub counts: Option<Vec<u64>>,
    /// Optional seed running means
    pub values: Option<Vec<f64>>,
    /// Descriptive metadata
    pub metadata: ExperimentMetadata,
}

impl NewExperiment {
    /// Create a builder for constructing a creation request.
    #[must_use]
    pub fn builder() -> NewExperimentBuilder {
        NewExperimentBuilder::default()
    }

    /// Normalise the request into a fresh record.
    pub(crate) fn into_record(self, config: &EngineConfig) -> Result<ExperimentRecord> {
        let arm_count = usize::try_from(self.arm_count)
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or_else(|| config.default_arm_count());
        if arm_count > MAX_ARMS {
            return Err(Error::InvalidArgument(format!(
                "arm count {arm_count} exceeds the maximum of {MAX_ARMS}"
            )));
        }

        #[allow(clippy::float_cmp)]
        let epsilon = if self.epsilon == 0.0 {
            config.default_epsilon()
        } else {
            self.epsilon
        };
        // Validates the parameters for the chosen variant
        self.strategy.build(epsilon)?;

        let statistics = match (self.counts, self.values) {
            (Some(counts), Some(values))
                if counts.len() == arm_count && values.len() == arm_count =>
            {
                ArmStatistics::seeded(counts, values)?
            }
            (None, None) => ArmStatistics::zeroed(arm_count),
            _ => {
                tracing::debug!(arm_count, "seed length mismatch, starting from zeroed statistics");
                ArmStatistics::zeroed(arm_count)
            }
        };

        let now = Utc::now();
        Ok(ExperimentRecord {
            id: ExperimentId::new(),
            arm_count,
            epsilon,
            strategy: self.strategy,
            statistics,
            created_at: now,
            updated_at: now,
            metadata: self.metadata,
        })
    }
}

/// Builder for `NewExperiment`.
#[derive(Debug, Default)]
pub struct NewExperimentBuilder {
    request: NewExperiment,
}

impl NewExperimentBuilder {
    /// Set the arm count.
    #[must_use]
    pub const fn arms(mut self, arm_count: i64) -> Self {
        self.request.arm_count = arm_count;
        self
    }

    /// Set the exploration probability.
    #[must_use]
    pub const fn epsilon(mut self, epsilon: f64) -> Self {
        self.request.epsilon = epsilon;
        self
    }

    /// Set the policy variant.
    #[must_use]
    pub const fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.request.strategy = strategy;
        self
    }

    /// Warm-start from prior counts and values.
    #[must_use]
    pub fn seed(mut self, counts: Vec<u64>, values: Vec<f64>) -> Self {
        self.request.counts = Some(counts);
        self.request.values = Some(values);
        self
    }

    /// Set the experiment name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.request.metadata.name = name.into();
        self
    }

    /// Set the experiment description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.request.metadata.description = description.into();
        self
    }

    /// Set the feature labels.
    #[must_use]
    pub fn features<I, F>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.request.metadata.features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Attach one free-form metadata field.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.request.metadata.meta.insert(key.into(), value);
        self
    }

    /// Build the `NewExperiment`.
    #[must_use]
    pub fn build(self) -> NewExperiment {
        self.request
    }
}

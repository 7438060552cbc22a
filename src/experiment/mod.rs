//! Experiment records and their transactional store
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord
//!   ├── id, arm_count, epsilon, strategy
//!   ├── ArmStatistics { counts[arm_count], values[arm_count] }
//!   ├── created_at, updated_at
//!   └── ExperimentMetadata { name, description, features, meta }
//! ```
//!
//! One record per experiment id, one key per record. Records are created by
//! `ExperimentStore::create`, mutated only by `ExperimentStore::update_arm`,
//! and removed by `ExperimentStore::delete`.

mod record;
mod store;

pub use record::{
    ExperimentId, ExperimentMetadata, ExperimentRecord, NewExperiment, NewExperimentBuilder,
    MAX_ARMS,
};
pub use store::ExperimentStore;

//! # Trueno-Bandit: Embedded Multi-Armed Bandit Decision Engine
//!
//! **Version**: 0.1.0
//!
//! Trueno-Bandit decides which option ("arm") of an experiment to offer next,
//! observes rewards, and keeps a running estimate of each arm's value,
//! balancing exploration of under-tried arms against exploitation of the
//! best-known one (epsilon-greedy).
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke**: Every reward is one atomic read-modify-write, so concurrent
//!   updates to an experiment can never lose an observation
//! - **Jidoka**: Out-of-range arms and bounded lock waits fail fast with a
//!   typed error instead of clamping or hanging
//! - **Heijunka**: Contention is scoped per experiment; unrelated experiments
//!   never wait on each other
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trueno_bandit::config::EngineConfig;
//! use trueno_bandit::experiment::NewExperiment;
//! use trueno_bandit::kv::MemoryKvStore;
//! use trueno_bandit::DecisionService;
//!
//! # async fn example() -> trueno_bandit::Result<()> {
//! let service = DecisionService::new(MemoryKvStore::new(), EngineConfig::default());
//! let experiment = service
//!     .create_experiment(NewExperiment::builder().arms(3).epsilon(0.1).build())
//!     .await?;
//! let id = experiment.id().to_string();
//!
//! let decision = service.select_arm(&id).await?;
//! let record = service.record_reward(&id, decision.arm, 1.0).await?;
//! println!("counts = {:?}, values = {:?}", record.counts(), record.values());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod bandit;
pub mod cache;
pub mod config;
pub mod error;
pub mod experiment;
pub mod kv;
pub mod service;

pub use error::{Error, Result};
pub use service::DecisionService;

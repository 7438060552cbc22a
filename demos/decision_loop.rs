//! Decision Loop Demo
//!
//! Run with: `cargo run --example decision_loop`
//!
//! Simulates a client alternating `select_arm` and `record_reward` against
//! Bernoulli arms with hidden conversion rates, then prints what the engine
//! learned. Set `RUST_LOG=trueno_bandit=debug` to see every decision.

use std::sync::Arc;

use anyhow::Context;
use rand::Rng;
use tracing_subscriber::EnvFilter;
use trueno_bandit::config::EngineConfig;
use trueno_bandit::experiment::NewExperiment;
use trueno_bandit::kv::MemoryKvStore;
use trueno_bandit::DecisionService;

/// Hidden conversion rate of each arm
const CONVERSION_RATES: [f64; 3] = [0.04, 0.11, 0.07];
const CLIENTS: usize = 8;
const ROUNDS_PER_CLIENT: usize = 1_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Trueno-Bandit Decision Loop Demo ===\n");

    let service = Arc::new(DecisionService::new(
        MemoryKvStore::new(),
        EngineConfig::builder().decision_cache_ttl(None).build()?,
    ));
    let experiment = service
        .create_experiment(
            NewExperiment::builder()
                .arms(i64::try_from(CONVERSION_RATES.len())?)
                .epsilon(0.1)
                .name("signup-button")
                .features(["grey", "green", "orange"])
                .build(),
        )
        .await?;
    let id = experiment.id().to_string();
    println!("Created experiment {id}");

    // Concurrent clients share one experiment record
    let mut clients = Vec::with_capacity(CLIENTS);
    for _ in 0..CLIENTS {
        let service = Arc::clone(&service);
        let id = id.clone();
        clients.push(tokio::spawn(async move {
            let mut exploits = 0usize;
            for _ in 0..ROUNDS_PER_CLIENT {
                let decision = service.select_arm(&id).await?;
                exploits += usize::from(decision.exploit);
                let converted = rand::thread_rng().gen_bool(CONVERSION_RATES[decision.arm]);
                service
                    .record_reward(&id, decision.arm, if converted { 1.0 } else { 0.0 })
                    .await?;
            }
            Ok::<_, trueno_bandit::Error>(exploits)
        }));
    }

    let mut exploits = 0;
    for client in clients {
        exploits += client.await.context("client task panicked")??;
    }

    let record = service.get_experiment(&id).await?;
    println!("\n{:<8} {:>8} {:>10} {:>10}", "arm", "pulls", "estimate", "true rate");
    for (arm, rate) in CONVERSION_RATES.iter().enumerate() {
        println!(
            "{:<8} {:>8} {:>10.4} {:>10.4}",
            record.metadata().features[arm],
            record.counts()[arm],
            record.values()[arm],
            rate
        );
    }
    println!(
        "\nTotal pulls: {} (exploit {exploits})",
        record.counts().iter().sum::<u64>()
    );

    Ok(())
}

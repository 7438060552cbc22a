//! Decision engine benchmarks
//!
//! - Pure policy: `decide` / `apply_reward` on in-memory statistics
//! - Store path: `select_arm` (read) and `update_arm` (locked read-modify-write)
//!
//! Toyota Way: Measure before optimizing (Genchi Genbutsu)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_bandit::bandit::{ArmStatistics, EpsilonGreedy, SeededRandom, Strategy, ThreadRandom};
use trueno_bandit::config::EngineConfig;
use trueno_bandit::experiment::{ExperimentStore, NewExperiment};
use trueno_bandit::kv::MemoryKvStore;

fn bench_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy");
    let policy = EpsilonGreedy::new(0.1).unwrap();
    let random = SeededRandom::new(42);

    for arms in [2usize, 16, 256] {
        let stats = ArmStatistics::zeroed(arms);
        group.bench_with_input(BenchmarkId::new("decide", arms), &stats, |b, stats| {
            b.iter(|| policy.decide(black_box(stats), &random).unwrap());
        });
    }

    group.bench_function("apply_reward", |b| {
        let mut stats = ArmStatistics::zeroed(16);
        b.iter(|| policy.apply_reward(&mut stats, black_box(3), black_box(1.0)).unwrap());
    });

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let store = ExperimentStore::new(MemoryKvStore::new(), EngineConfig::default());
    let id = runtime
        .block_on(store.create(NewExperiment::builder().arms(8).build()))
        .unwrap()
        .id();

    let mut group = c.benchmark_group("store");

    group.bench_function("select_arm", |b| {
        b.to_async(&runtime)
            .iter(|| async { store.select_arm(&id, &ThreadRandom).await.unwrap() });
    });

    group.bench_function("update_arm", |b| {
        b.to_async(&runtime)
            .iter(|| async { store.update_arm(&id, black_box(5), 1.0).await.unwrap() });
    });

    group.finish();
}

criterion_group!(benches, bench_policy, bench_store);
criterion_main!(benches);

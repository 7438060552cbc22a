//! Random sources for arm selection
//!
//! Decisions never touch process-wide generator state: every caller threads a
//! `RandomSource` through `Strategy::decide`, so tests can substitute a seeded
//! or scripted source and replay exact decision sequences.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplier of uniform random draws.
pub trait RandomSource: Send + Sync {
    /// Uniform real in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Uniform integer in `[0, upper)`. `upper` is at least 1.
    fn next_index(&self, upper: usize) -> usize;
}

/// Thread-local OS-seeded generator. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn next_index(&self, upper: usize) -> usize {
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Reproducible generator seeded from a fixed value.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a generator from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen::<f64>()
    }

    fn next_index(&self, upper: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..upper)
    }
}

/// Replays scripted draws in order.
///
/// Once a script is exhausted it keeps returning `0.0` / index `0`.
/// Scripted indices are reduced modulo `upper` so they always stay in range.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    floats: Mutex<VecDeque<f64>>,
    indices: Mutex<VecDeque<usize>>,
}

impl ScriptedRandom {
    /// Create a source replaying `floats` for `next_f64` and `indices` for `next_index`.
    #[must_use]
    pub fn new(floats: impl IntoIterator<Item = f64>, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            floats: Mutex::new(floats.into_iter().collect()),
            indices: Mutex::new(indices.into_iter().collect()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        self.floats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(0.0)
    }

    fn next_index(&self, upper: usize) -> usize {
        self.indices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .map_or(0, |i| i % upper)
    }
}

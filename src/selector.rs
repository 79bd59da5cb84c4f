//! Puzzle selection and the injected randomness source

use crate::catalog::{PuzzleCatalog, PuzzleId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Source of uniform indices.
///
/// `pick(n)` returns a value in `0..n`. Callers never pass `n == 0`.
pub trait RandomSource: Send + Sync {
    fn pick(&self, n: usize) -> usize;
}

impl<T: RandomSource + ?Sized> RandomSource for Arc<T> {
    fn pick(&self, n: usize) -> usize {
        (**self).pick(n)
    }
}

/// Pick an element of a non-empty slice
pub fn choose<'a, T, R: RandomSource + ?Sized>(rng: &R, items: &'a [T]) -> &'a T {
    &items[rng.pick(items.len())]
}

/// Production source backed by the thread-local RNG; no shared state between chats
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, n: usize) -> usize {
        rand::thread_rng().gen_range(0..n)
    }
}

/// Deterministic source for reproducible runs
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&self, n: usize) -> usize {
        // A poisoned RNG is still a valid RNG
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rng.gen_range(0..n)
    }
}

/// Either of the two runtime sources, chosen from configuration
#[derive(Debug)]
pub enum ConfiguredRandom {
    Thread(ThreadRandom),
    Seeded(SeededRandom),
}

impl ConfiguredRandom {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => ConfiguredRandom::Seeded(SeededRandom::new(seed)),
            None => ConfiguredRandom::Thread(ThreadRandom),
        }
    }
}

impl RandomSource for ConfiguredRandom {
    fn pick(&self, n: usize) -> usize {
        match self {
            ConfiguredRandom::Thread(rng) => rng.pick(n),
            ConfiguredRandom::Seeded(rng) => rng.pick(n),
        }
    }
}

/// Outcome of asking for the next puzzle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Puzzle(PuzzleId),
    Exhausted,
}

/// Pick the next unused puzzle uniformly at random.
///
/// Ids in `used` that are not in the catalog are ignored.
pub fn next_puzzle<R: RandomSource + ?Sized>(
    catalog: &PuzzleCatalog,
    used: &BTreeSet<PuzzleId>,
    rng: &R,
) -> Selection {
    let remaining: Vec<&PuzzleId> = catalog
        .all_ids()
        .iter()
        .filter(|id| !used.contains(*id))
        .collect();

    if remaining.is_empty() {
        return Selection::Exhausted;
    }

    Selection::Puzzle(remaining[rng.pick(remaining.len())].clone())
}

//! Random number generation for the simulation.
//!
//! Every decision the core makes at random goes through the [`RandomSource`]
//! capability: a uniform integer in `[0, n)`. Production runs use
//! [`SeededRandom`], one independent stream per name derived from the base seed
//! set with [`ContextRandomExt::init_random`]. Tests substitute
//! [`ScriptedRandom`] to drive agents through exact decision paths.
use std::collections::VecDeque;

use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::context::Context;
use crate::define_data_plugin;
use crate::hashing::hash_str;

/// A source of uniform random integers.
pub trait RandomSource {
    /// Returns a uniform integer in `[0, n)`. `n` must be positive.
    fn below(&mut self, n: u32) -> u32;
}

/// A reproducible stream backed by `SmallRng`.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, n: u32) -> u32 {
        self.rng.random_range(0..n)
    }
}

/// Replays a fixed sequence of values, each reduced modulo the requested
/// bound. Yields `0` once the sequence is exhausted.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    values: VecDeque<u32>,
}

impl ScriptedRandom {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        ScriptedRandom {
            values: values.into_iter().collect(),
        }
    }

    /// Appends more values to the end of the script.
    pub fn extend(&mut self, values: impl IntoIterator<Item = u32>) {
        self.values.extend(values);
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, n: u32) -> u32 {
        self.values.pop_front().map_or(0, |value| value % n)
    }
}

/// The result of a bounded retry search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Retry<T> {
    /// A candidate satisfied the predicate.
    Found(T),
    /// Every attempt was rejected; holds the last candidate sampled.
    Exhausted(T),
}

impl<T> Retry<T> {
    /// The accepted candidate, or the last one sampled when the budget ran out.
    pub fn into_inner(self) -> T {
        match self {
            Retry::Found(value) | Retry::Exhausted(value) => value,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Retry::Found(_))
    }
}

/// Samples candidates until one is accepted or `attempts` samples have been
/// drawn.
///
/// # Panics
///
/// Panics if `attempts` is zero, since there would be no candidate to return.
pub fn retry<T>(
    attempts: usize,
    mut sample: impl FnMut() -> T,
    mut accept: impl FnMut(&T) -> bool,
) -> Retry<T> {
    assert!(attempts > 0, "retry needs at least one attempt");
    let mut candidate = sample();
    for _ in 1..attempts {
        if accept(&candidate) {
            return Retry::Found(candidate);
        }
        candidate = sample();
    }
    if accept(&candidate) {
        Retry::Found(candidate)
    } else {
        Retry::Exhausted(candidate)
    }
}

struct RngData {
    base_seed: u64,
}

define_data_plugin!(RngPlugin, RngData, RngData { base_seed: 0 });

// This is a trait extension on Context for
// random number generation functionality.
pub trait ContextRandomExt {
    /// Sets the base seed from which every named stream is derived.
    fn init_random(&mut self, base_seed: u64);

    /// Creates the stream for `name`. The same base seed and name always
    /// produce the same sequence; different names produce independent ones.
    /// Without a call to `init_random` the base seed is 0.
    fn random_stream(&self, name: &str) -> SeededRandom;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with seed {base_seed}");
        self.get_data_mut(RngPlugin).base_seed = base_seed;
    }

    fn random_stream(&self, name: &str) -> SeededRandom {
        let base_seed = self.get_data(RngPlugin).map_or(0, |data| data.base_seed);
        trace!("creating random stream {name} (seed={base_seed})");
        SeededRandom::new(base_seed.wrapping_add(hash_str(name)))
    }
}

//! Deterministic hashing helpers. The standard library `HashMap` seeds its hasher randomly,
//! so iteration order and hashes differ between runs. Everything here is stable across runs,
//! which keeps named random streams reproducible for a given base seed.
//!
//! `HashMap` does not have a `new` method with a non-default hasher; use
//! `HashMap::default()` instead.

pub use rustc_hash::FxHashMap as HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

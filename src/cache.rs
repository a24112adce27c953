//! Noise Cache
//!
//! Memoizes one constructed noise field per seed so repeated renders of the
//! same planet skip the permutation-table build. Each render worker owns its
//! own cache; nothing here is shared across threads.

use std::collections::HashMap;
use std::sync::Arc;

use crate::noise::Perlin;

/// Seed → noise field map, keyed by the seed's string form.
/// Entries live for the worker's lifetime and are never evicted.
pub struct NoiseCache {
    entries: HashMap<String, Arc<Perlin>>,
}

impl NoiseCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Return the cached field for `seed`, building and inserting it on first
    /// use. This is also the entire behavior of a preload: warm the cache,
    /// no pixel work, no reply.
    pub fn ensure(&mut self, seed: f32) -> Arc<Perlin> {
        self.entries
            .entry(format!("{}", seed))
            .or_insert_with(|| Arc::new(Perlin::new(seed)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for NoiseCache {
    fn default() -> Self {
        Self::new()
    }
}

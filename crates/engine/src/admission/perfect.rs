//! Exact frequency counting.
//!
//! Keeps a full per-key counter map. Memory grows with the number of
//! distinct keys in the trace, which is acceptable for reference runs that
//! want admission decisions free of sketch error.

use rustc_hash::FxHashMap;

use super::Frequency;

/// Unbounded exact access counters.
#[derive(Default)]
pub struct PerfectFrequency {
    counts: FxHashMap<u64, u32>,
}

impl PerfectFrequency {
    /// Creates an empty counter map.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Frequency for PerfectFrequency {
    fn increment(&mut self, key: u64) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    fn frequency(&self, key: u64) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }
}

//! Single-block CRA policy.
//!
//! Wraps one [`CraBlock`] with latency-aware admission: on a miss that
//! forces eviction, the admittor arbitrates between the arriving candidate
//! and the block's victim, and the loser stays out. With admission
//! bypassed this is the bare benefit-bucketed store.

use crate::admission::Admittor;
use crate::config::Config;
use crate::event::AccessEvent;
use crate::stats::PolicyStats;

use super::block::{CraBlock, RecordResult};
use super::normalization::Normalizer;
use super::Policy;

/// One benefit-bucketed block plus an admission filter.
pub struct CraPolicy {
    stats: PolicyStats,
    block: CraBlock,
    admittor: Box<dyn Admittor>,
    normalizer: Normalizer,
    maximum_size: u64,
}

impl CraPolicy {
    /// Builds the policy from the run configuration and one rank exponent.
    pub fn new(config: &Config, k: f64, admittor: Box<dyn Admittor>) -> Self {
        let max_lists = config.cra.max_lists;
        Self {
            stats: PolicyStats::new(format!("CRA (k={k}, max-lists={max_lists})")),
            block: CraBlock::new(k, max_lists, config.maximum_size as u64),
            admittor,
            normalizer: Normalizer::new(),
            maximum_size: config.maximum_size as u64,
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// True when nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// True when `key` is resident.
    pub fn contains(&self, key: u64) -> bool {
        self.block.contains(key)
    }
}

impl Policy for CraPolicy {
    fn record(&mut self, event: AccessEvent) {
        self.stats.record_operation();
        if event.has_nan_penalty() || u64::from(event.weight()) > self.maximum_size {
            return;
        }

        self.admittor.record(&event);
        let weight = event.weight();
        let hit_penalty = event.hit_penalty();
        let miss_penalty = event.miss_penalty();

        if !self.block.contains(event.key()) {
            self.normalizer.on_miss(event.delta());
            self.normalizer.apply_to(&mut self.block);
        }

        let admittor = &mut self.admittor;
        let stats = &mut self.stats;
        let result = self
            .block
            .record_with(event, |candidate, victim| {
                admittor.admit(candidate, victim, stats)
            });

        match result {
            RecordResult::Hit => {
                self.stats.record_weighted_hit(weight);
                self.stats.record_hit_penalty(hit_penalty);
            }
            RecordResult::Expired => {
                self.stats.record_eviction();
                self.stats.record_weighted_miss(weight);
                self.stats.record_miss_penalty(miss_penalty);
            }
            RecordResult::Miss { evicted, .. } => {
                self.stats.record_weighted_miss(weight);
                self.stats.record_miss_penalty(miss_penalty);
                for _ in &evicted {
                    self.stats.record_eviction();
                }
            }
            RecordResult::Dropped => {}
        }
    }

    fn finished(&mut self) {
        let listed: usize = self.block.active_lists().map(|i| self.block.list_len(i)).sum();
        assert_eq!(
            listed,
            self.block.len(),
            "bucket sizes disagree with the resident index"
        );
        assert!(
            self.block.current_size() <= self.block.capacity(),
            "resident weight {} exceeds capacity {}",
            self.block.current_size(),
            self.block.capacity()
        );
    }

    fn stats(&self) -> &PolicyStats {
        &self.stats
    }
}

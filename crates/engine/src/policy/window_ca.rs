//! Latency-aware windowed TinyLFU policy.
//!
//! Three benefit-bucketed blocks form the classic window cache shape: new
//! entries land in a small admission **window**; entries spilled from the
//! window pass a TinyLFU admission test against the **probation** victim;
//! probation entries that hit again are promoted into **protected**, which
//! demotes its own victims back to probation when it overflows.
//!
//! A single segment tag per key answers residency questions without
//! scanning the blocks, and one [`Normalizer`] keeps all three blocks
//! bucketing deltas identically.

use rustc_hash::FxHashMap;

use crate::admission::Admittor;
use crate::config::Config;
use crate::event::AccessEvent;
use crate::stats::PolicyStats;

use super::block::{AccessResult, CraBlock};
use super::normalization::Normalizer;
use super::{Policy, Segment};

/// Windowed TinyLFU over three CRA blocks.
pub struct WindowCaPolicy {
    stats: PolicyStats,
    admittor: Box<dyn Admittor>,
    normalizer: Normalizer,
    window: CraBlock,
    probation: CraBlock,
    protected: CraBlock,
    segments: FxHashMap<u64, Segment>,
    maximum_size: usize,
    max_window: usize,
    max_protected: usize,
    window_size: usize,
    protected_size: usize,
}

impl WindowCaPolicy {
    /// Builds the policy from the run configuration and one rank exponent.
    pub fn new(config: &Config, k: f64, admittor: Box<dyn Admittor>) -> Self {
        let maximum_size = config.maximum_size;
        let max_main = (maximum_size as f64 * config.window.percent_main) as usize;
        let max_protected = (max_main as f64 * config.window.percent_main_protected) as usize;
        let max_window = maximum_size - max_main;
        let max_lists = config.cra.max_lists;
        let name = format!(
            "WindowCA (window {:.0}%, k={k}, max-lists={max_lists})",
            100.0 * (1.0 - config.window.percent_main)
        );
        Self {
            stats: PolicyStats::new(name),
            admittor,
            normalizer: Normalizer::new(),
            window: CraBlock::new(k, max_lists, max_window as u64),
            probation: CraBlock::new(k, max_lists, (max_main - max_protected) as u64),
            protected: CraBlock::new(k, max_lists, max_protected as u64),
            segments: FxHashMap::default(),
            maximum_size,
            max_window,
            max_protected,
            window_size: 0,
            protected_size: 0,
        }
    }

    /// Number of resident entries across all segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segment holding `key`, if it is resident.
    pub fn segment_of(&self, key: u64) -> Option<Segment> {
        self.segments.get(&key).copied()
    }

    /// Current window entry count.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Current probation entry count.
    pub fn probation_len(&self) -> usize {
        self.probation.len()
    }

    /// Current protected entry count.
    pub fn protected_len(&self) -> usize {
        self.protected.len()
    }

    /// Publishes the current normalization into all three blocks.
    fn update_normalization(&mut self) {
        self.normalizer.apply_to(&mut self.window);
        self.normalizer.apply_to(&mut self.probation);
        self.normalizer.apply_to(&mut self.protected);
    }

    /// Admits a missed event into the window, spilling as needed.
    fn on_miss(&mut self, event: AccessEvent) {
        let key = event.key();
        self.window.insert_event(event);
        self.segments.insert(key, Segment::Window);
        self.window_size += 1;
        self.evict();
    }

    /// Discards an entry whose delta turned negative.
    fn on_expired(&mut self, key: u64, weight: u32, miss_penalty: f64) {
        self.segments.remove(&key);
        self.stats.record_eviction();
        self.stats.record_weighted_miss(weight);
        self.stats.record_miss_penalty(miss_penalty);
    }

    /// Touches a window-resident entry.
    fn on_window_hit(&mut self, event: &AccessEvent) {
        match self.window.on_access(event.key()) {
            AccessResult::Retained => {
                self.stats.record_weighted_hit(event.weight());
                self.stats.record_hit_penalty(event.hit_penalty());
            }
            AccessResult::Removed(_) => {
                self.window_size -= 1;
                self.on_expired(event.key(), event.weight(), event.miss_penalty());
            }
        }
    }

    /// Promotes a probation-resident entry into protected.
    fn on_probation_hit(&mut self, event: &AccessEvent) {
        let key = event.key();
        let node = self
            .probation
            .remove(key)
            .expect("probation hit on a key the probation block does not hold");
        if node.event().delta() < 0.0 {
            self.on_expired(key, event.weight(), event.miss_penalty());
            return;
        }
        self.protected.insert_node(node);
        self.segments.insert(key, Segment::Protected);
        self.protected_size += 1;
        self.demote_protected();
        self.stats.record_weighted_hit(event.weight());
        self.stats.record_hit_penalty(event.hit_penalty());
    }

    /// Touches a protected-resident entry.
    fn on_protected_hit(&mut self, event: &AccessEvent) {
        match self.protected.on_access(event.key()) {
            AccessResult::Retained => {
                self.stats.record_weighted_hit(event.weight());
                self.stats.record_hit_penalty(event.hit_penalty());
            }
            AccessResult::Removed(_) => {
                self.protected_size -= 1;
                self.on_expired(event.key(), event.weight(), event.miss_penalty());
            }
        }
    }

    /// Moves the protected victim back to probation when protected
    /// overflows.
    fn demote_protected(&mut self) {
        if self.protected_size > self.max_protected {
            let demote_key = self.protected.find_victim();
            let node = self
                .protected
                .remove(demote_key)
                .expect("protected victim vanished before demotion");
            self.probation.insert_node(node);
            self.segments.insert(demote_key, Segment::Probation);
            self.protected_size -= 1;
        }
    }

    /// Spills the window victim into probation and, when the cache is over
    /// capacity, lets the admittor pick which of spill candidate and
    /// probation victim survives.
    fn evict(&mut self) {
        if self.window_size <= self.max_window {
            return;
        }

        let candidate_key = self.window.find_victim();
        let node = self
            .window
            .remove(candidate_key)
            .expect("window victim vanished before spill");
        self.window_size -= 1;
        self.probation.insert_node(node);
        self.segments.insert(candidate_key, Segment::Probation);

        if self.segments.len() > self.maximum_size {
            let victim_key = self.probation.find_victim();
            let candidate = self
                .probation
                .event_of(candidate_key)
                .expect("spill candidate missing from probation")
                .clone();
            let victim = self
                .probation
                .event_of(victim_key)
                .expect("probation victim missing from probation")
                .clone();
            let admitted = self.admittor.admit(&candidate, &victim, &mut self.stats);
            let loser_key = if admitted { victim_key } else { candidate_key };
            self.probation.remove(loser_key);
            self.segments.remove(&loser_key);
            self.stats.record_eviction();
            log::trace!("evicted {loser_key} (candidate {candidate_key} admitted: {admitted})");
        }
    }
}

impl Policy for WindowCaPolicy {
    fn record(&mut self, event: AccessEvent) {
        self.stats.record_operation();
        if event.has_nan_penalty() || event.weight() as usize > self.maximum_size {
            return;
        }

        let key = event.key();
        match self.segments.get(&key).copied() {
            None => {
                self.normalizer.on_miss(event.delta());
                self.update_normalization();
                self.admittor.record(&event);
                self.stats.record_weighted_miss(event.weight());
                self.stats.record_miss_penalty(event.miss_penalty());
                self.on_miss(event);
            }
            Some(segment) => {
                self.admittor.record(&event);
                match segment {
                    Segment::Window => {
                        self.window.update_hit_penalty(key, event.hit_penalty());
                        self.on_window_hit(&event);
                    }
                    Segment::Probation => {
                        self.probation.update_hit_penalty(key, event.hit_penalty());
                        self.on_probation_hit(&event);
                    }
                    Segment::Protected => {
                        self.protected.update_hit_penalty(key, event.hit_penalty());
                        self.on_protected_hit(&event);
                    }
                }
            }
        }
    }

    fn finished(&mut self) {
        let tagged = |segment: Segment| {
            self.segments
                .values()
                .filter(|&&s| s == segment)
                .count()
        };
        assert_eq!(self.window.len(), self.window_size, "window size drift");
        assert_eq!(
            self.protected.len(),
            self.protected_size,
            "protected size drift"
        );
        assert_eq!(tagged(Segment::Window), self.window.len(), "window tags drift");
        assert_eq!(
            tagged(Segment::Probation),
            self.probation.len(),
            "probation tags drift"
        );
        assert_eq!(
            tagged(Segment::Protected),
            self.protected.len(),
            "protected tags drift"
        );
        assert_eq!(
            self.probation.len(),
            self.segments.len() - self.window_size - self.protected_size,
            "probation size drift"
        );
        assert!(
            self.segments.len() <= self.maximum_size,
            "residency {} exceeds maximum {}",
            self.segments.len(),
            self.maximum_size
        );
    }

    fn stats(&self) -> &PolicyStats {
        &self.stats
    }
}

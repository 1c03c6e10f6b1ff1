//! Windowed TinyLFU with online window sizing.
//!
//! The same three-segment layout as [`WindowCaPolicy`], plus a hill
//! climber that watches the average service penalty and trades capacity
//! between the admission window and the protected segment. Window and
//! protected sizes are tracked as fractional counts so the climber can
//! accumulate sub-entry quotas; entries only move when a whole step is
//! crossed.
//!
//! [`WindowCaPolicy`]: super::window_ca::WindowCaPolicy

use rustc_hash::FxHashMap;

use crate::admission::Admittor;
use crate::config::Config;
use crate::event::AccessEvent;
use crate::stats::PolicyStats;

use super::block::{AccessResult, CraBlock};
use super::climb::{Adaptation, HillClimber};
use super::normalization::Normalizer;
use super::{Policy, Segment};

/// Windowed TinyLFU with a penalty-driven window climber.
pub struct AdaptiveCaPolicy {
    stats: PolicyStats,
    admittor: Box<dyn Admittor>,
    normalizer: Normalizer,
    climber: HillClimber,
    window: CraBlock,
    probation: CraBlock,
    protected: CraBlock,
    segments: FxHashMap<u64, Segment>,
    maximum_size: usize,
    max_window: usize,
    max_protected: usize,
    window_size: f64,
    protected_size: f64,
    initial_percent_main: f64,
}

impl AdaptiveCaPolicy {
    /// Builds the policy from the run configuration and one rank exponent.
    pub fn new(config: &Config, k: f64, admittor: Box<dyn Admittor>) -> Self {
        let maximum_size = config.maximum_size;
        let percent_main = config.window.percent_main;
        let max_main = (maximum_size as f64 * percent_main) as usize;
        let max_protected = (max_main as f64 * config.window.percent_main_protected) as usize;
        let max_window = maximum_size - max_main;
        let max_lists = config.cra.max_lists;
        let name = format!(
            "AdaptiveCA-{:?} (window {:.0}%, k={k}, max-lists={max_lists})",
            config.climber.strategy,
            100.0 * (1.0 - percent_main)
        );
        Self {
            stats: PolicyStats::new(name),
            admittor,
            normalizer: Normalizer::new(),
            climber: HillClimber::new(&config.climber, maximum_size),
            window: CraBlock::new(k, max_lists, max_window as u64),
            probation: CraBlock::new(k, max_lists, (max_main - max_protected) as u64),
            protected: CraBlock::new(k, max_lists, max_protected as u64),
            segments: FxHashMap::default(),
            maximum_size,
            max_window,
            max_protected,
            window_size: 0.0,
            protected_size: 0.0,
            initial_percent_main: percent_main,
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

    /// Current window capacity in entries.
    pub fn max_window(&self) -> usize {
        self.max_window
    }

    /// Current protected capacity in entries.
    pub fn max_protected(&self) -> usize {
        self.max_protected
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
        self.window_size += 1.0;
        self.evict();
    }

    /// Discards an entry whose delta turned negative.
    fn on_expired(&mut self, key: u64, weight: u32, miss_penalty: f64) {
        self.segments.remove(&key);
        self.stats.record_eviction();
        self.stats.record_weighted_miss(weight);
        self.stats.record_miss_penalty(miss_penalty);
    }

    /// Touches a resident entry in its segment.
    ///
    /// Returns the segment that serviced the hit, or `None` when the entry
    /// expired on touch.
    fn on_hit(&mut self, event: &AccessEvent, segment: Segment) -> Option<Segment> {
        let key = event.key();
        match segment {
            Segment::Window => match self.window.on_access(key) {
                AccessResult::Retained => {}
                AccessResult::Removed(_) => {
                    self.window_size -= 1.0;
                    self.on_expired(key, event.weight(), event.miss_penalty());
                    return None;
                }
            },
            Segment::Probation => {
                let node = self
                    .probation
                    .remove(key)
                    .expect("probation hit on a key the probation block does not hold");
                if node.event().delta() < 0.0 {
                    self.on_expired(key, event.weight(), event.miss_penalty());
                    return None;
                }
                self.protected.insert_node(node);
                self.segments.insert(key, Segment::Protected);
                self.protected_size += 1.0;
                self.demote_protected();
            }
            Segment::Protected => match self.protected.on_access(key) {
                AccessResult::Retained => {}
                AccessResult::Removed(_) => {
                    self.protected_size -= 1.0;
                    self.on_expired(key, event.weight(), event.miss_penalty());
                    return None;
                }
            },
        }
        self.stats.record_weighted_hit(event.weight());
        self.stats.record_hit_penalty(event.hit_penalty());
        Some(segment)
    }

    /// Moves the protected victim back to probation when protected
    /// overflows.
    fn demote_protected(&mut self) {
        if self.protected_size > self.max_protected as f64 {
            let demote_key = self.protected.find_victim();
            let node = self
                .protected
                .remove(demote_key)
                .expect("protected victim vanished before demotion");
            self.probation.insert_node(node);
            self.segments.insert(demote_key, Segment::Probation);
            self.protected_size -= 1.0;
        }
    }

    /// Spills the window victim into probation, arbitrating at capacity.
    fn evict(&mut self) {
        if self.window_size <= self.max_window as f64 {
            return;
        }

        let candidate_key = self.window.find_victim();
        let node = self
            .window
            .remove(candidate_key)
            .expect("window victim vanished before spill");
        self.window_size -= 1.0;
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
        }
    }

    /// Feeds the climber and applies its verdict.
    fn climb(&mut self, event: &AccessEvent, serviced_by: Option<Segment>, is_full: bool) {
        match serviced_by {
            None => self.climber.on_miss(event, is_full),
            Some(segment) => self.climber.on_hit(event, segment, is_full),
        }

        let probation_size = self.maximum_size as f64 - self.window_size - self.protected_size;
        let adaptation =
            self.climber
                .adapt(self.window_size, probation_size, self.protected_size, is_full);
        match adaptation {
            Adaptation::Hold => {}
            Adaptation::IncreaseWindow(amount) => self.increase_window(amount),
            Adaptation::DecreaseWindow(amount) => self.decrease_window(amount),
        }
    }

    /// Grows the window by up to `amount` entries at protected's expense.
    fn increase_window(&mut self, amount: f64) {
        assert!(amount >= 0.0, "window increase must be non-negative");
        if self.max_protected == 0 {
            return;
        }

        let quota = amount.min(self.max_protected as f64);
        let steps = (self.window_size + quota) as u64 - self.window_size as u64;
        self.window_size += quota;

        for _ in 0..steps {
            self.max_window += 1;
            self.max_protected -= 1;

            self.demote_protected();
            let key = self.probation.find_victim();
            let node = self
                .probation
                .remove(key)
                .expect("probation victim vanished during window growth");
            self.window.insert_node(node);
            self.segments.insert(key, Segment::Window);
        }
        if steps > 0 {
            log::debug!(
                "window +{steps} (max_window={}, max_protected={})",
                self.max_window,
                self.max_protected
            );
        }
    }

    /// Shrinks the window by up to `amount` entries in protected's favor.
    fn decrease_window(&mut self, amount: f64) {
        assert!(amount >= 0.0, "window decrease must be non-negative");
        if self.max_window == 0 {
            return;
        }

        let quota = amount.min(self.window_size);
        let steps = self.window_size as u64 - (self.window_size - quota) as u64;
        self.window_size -= quota;

        for _ in 0..steps {
            self.max_window -= 1;
            self.max_protected += 1;

            let key = self.window.find_victim();
            let node = self
                .window
                .remove(key)
                .expect("window victim vanished during window shrink");
            self.probation.insert_node(node);
            self.segments.insert(key, Segment::Probation);
        }
        if steps > 0 {
            log::debug!(
                "window -{steps} (max_window={}, max_protected={})",
                self.max_window,
                self.max_protected
            );
        }
    }
}

impl Policy for AdaptiveCaPolicy {
    fn record(&mut self, event: AccessEvent) {
        self.stats.record_operation();
        if event.has_nan_penalty() || event.weight() as usize > self.maximum_size {
            return;
        }

        let key = event.key();
        let is_full = self.segments.len() >= self.maximum_size;
        self.admittor.record(&event);

        let serviced_by = match self.segments.get(&key).copied() {
            None => {
                self.normalizer.on_miss(event.delta());
                self.update_normalization();
                self.stats.record_weighted_miss(event.weight());
                self.stats.record_miss_penalty(event.miss_penalty());
                self.on_miss(event.clone());
                None
            }
            Some(segment) => {
                let block = match segment {
                    Segment::Window => &mut self.window,
                    Segment::Probation => &mut self.probation,
                    Segment::Protected => &mut self.protected,
                };
                if let Some(resident) = block.event_of(key) {
                    self.stats
                        .record_approx_accuracy(event.miss_penalty(), resident.miss_penalty());
                }
                block.update_hit_penalty(key, event.hit_penalty());
                self.on_hit(&event, segment)
            }
        };

        self.climb(&event, serviced_by, is_full);
    }

    fn finished(&mut self) {
        self.stats.set_percent_adaption(
            self.max_window as f64 / self.maximum_size as f64 - (1.0 - self.initial_percent_main),
        );

        assert_eq!(
            self.window.len() as u64,
            self.window_size as u64,
            "window size drift"
        );
        assert_eq!(
            self.protected.len() as u64,
            self.protected_size as u64,
            "protected size drift"
        );
        assert_eq!(
            self.probation.len(),
            self.segments.len() - self.window.len() - self.protected.len(),
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

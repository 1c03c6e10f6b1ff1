//! Admission control.
//!
//! Implements the filters that decide whether a newly arrived entry may
//! displace an established victim.
//!
//! # Components
//!
//! - [`Frequency`]: the estimator interface behind TinyLFU.
//! - [`PeriodicResetCountMin4`]: 4-bit count-min sketch with periodic aging.
//! - [`PerfectFrequency`]: exact counters, for reference results.
//! - [`LaTinyLfu`]: admission by comparing `frequency × delta`.
//! - [`AlwaysAdmit`]: the bypass used when admission is disabled.

/// 4-bit count-min sketch with periodic halving.
pub mod count_min;

/// Exact per-key frequency counters.
pub mod perfect;

pub use count_min::PeriodicResetCountMin4;
pub use perfect::PerfectFrequency;

use crate::config::{SketchConfig, SketchType};
use crate::event::AccessEvent;
use crate::stats::PolicyStats;

/// Trait for popularity estimators feeding the admission filter.
pub trait Frequency {
    /// Notes one access to `key`.
    fn increment(&mut self, key: u64);

    /// Returns the estimated access count for `key`.
    ///
    /// Estimates are small saturating integers; relative order is what
    /// matters to admission.
    fn frequency(&self, key: u64) -> u32;

    /// Notes that the cache missed; estimators with miss-driven aging hook
    /// in here.
    fn report_miss(&mut self) {}
}

/// Trait for admission filters guarding a cache region.
pub trait Admittor {
    /// Observes an access for frequency bookkeeping.
    fn record(&mut self, event: &AccessEvent);

    /// Decides between an arriving candidate and the region's victim.
    ///
    /// Returns `true` when the candidate should replace the victim. The
    /// outcome is recorded into `stats` by implementations that arbitrate
    /// (the bypass records nothing).
    fn admit(&mut self, candidate: &AccessEvent, victim: &AccessEvent, stats: &mut PolicyStats)
        -> bool;
}

/// Admission bypass: every candidate replaces the victim.
pub struct AlwaysAdmit;

impl Admittor for AlwaysAdmit {
    fn record(&mut self, _event: &AccessEvent) {}

    fn admit(
        &mut self,
        _candidate: &AccessEvent,
        _victim: &AccessEvent,
        _stats: &mut PolicyStats,
    ) -> bool {
        true
    }
}

/// Latency-aware TinyLFU.
///
/// Admits the candidate only when its estimated frequency weighted by its
/// caching benefit beats the victim's. Ties reject, keeping the incumbent.
pub struct LaTinyLfu {
    sketch: Box<dyn Frequency>,
}

impl LaTinyLfu {
    /// Wraps a frequency estimator in the admission filter.
    pub fn new(sketch: Box<dyn Frequency>) -> Self {
        Self { sketch }
    }

    /// Returns the estimated access count for `key`.
    pub fn frequency(&self, key: u64) -> u32 {
        self.sketch.frequency(key)
    }
}

impl Admittor for LaTinyLfu {
    fn record(&mut self, event: &AccessEvent) {
        self.sketch.increment(event.key());
    }

    fn admit(
        &mut self,
        candidate: &AccessEvent,
        victim: &AccessEvent,
        stats: &mut PolicyStats,
    ) -> bool {
        self.sketch.report_miss();
        let candidate_score = candidate.delta() * f64::from(self.sketch.frequency(candidate.key()));
        let victim_score = victim.delta() * f64::from(self.sketch.frequency(victim.key()));
        if candidate_score > victim_score {
            stats.record_admission();
            true
        } else {
            stats.record_rejection();
            false
        }
    }
}

/// Builds the frequency estimator selected by the configuration.
pub fn build_sketch(config: &SketchConfig, maximum_size: usize) -> Box<dyn Frequency> {
    match config.kind {
        SketchType::CountMin4 | SketchType::AlwaysAdmit => Box::new(PeriodicResetCountMin4::new(
            maximum_size,
            config.sample_factor,
        )),
        SketchType::Perfect => Box::new(PerfectFrequency::new()),
    }
}

/// Builds the admission filter selected by the configuration.
pub fn build_admittor(config: &SketchConfig, maximum_size: usize) -> Box<dyn Admittor> {
    match config.kind {
        SketchType::AlwaysAdmit => Box::new(AlwaysAdmit),
        _ => Box::new(LaTinyLfu::new(build_sketch(config, maximum_size))),
    }
}

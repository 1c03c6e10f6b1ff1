//! Adaptive window policy tests.
//!
//! Exercises the hill-climbing resize machinery around the segmented
//! cache: window growth under a fresh penalty signal, shrinkage when the
//! signal worsens, the no-op guards at the segment limits, and the
//! terminal consistency checks.

use casim_core::admission::AlwaysAdmit;
use casim_core::config::{ClimberStrategy, Config};
use casim_core::policy::{AdaptiveCaPolicy, Policy, Segment};

use crate::common::event;

/// Capacity 10, window 5 / probation 3 / protected 2, simple climber with
/// a 5-request sample and a 2-entry step, no decay.
fn adaptive_config() -> Config {
    let mut config = Config::default();
    config.maximum_size = 10;
    config.window.percent_main = 0.5;
    config.window.percent_main_protected = 0.5;
    config.climber.strategy = ClimberStrategy::Simple;
    config.climber.percent_sample = 0.5;
    config.climber.percent_pivot = 0.2;
    config.climber.simple.step_decay_rate = 1.0;
    config.climber.simple.sample_decay_rate = 1.0;
    config
}

fn adaptive_policy() -> AdaptiveCaPolicy {
    AdaptiveCaPolicy::new(&adaptive_config(), 1.0, Box::new(AlwaysAdmit))
}

/// Fills the cache with keys 1..=10 so the climber starts sampling.
fn fill(policy: &mut AdaptiveCaPolicy) {
    for key in 1..=10 {
        policy.record(event(key, 1.0, 10.0));
    }
    assert_eq!(policy.len(), 10);
}

// ══════════════════════════════════════════════════════════
// 1. Segment flows
// ══════════════════════════════════════════════════════════

/// Misses land in the window and spill like the non-adaptive policy.
#[test]
fn miss_enters_window() {
    let mut policy = adaptive_policy();
    policy.record(event(1, 1.0, 10.0));
    assert_eq!(policy.segment_of(1), Some(Segment::Window));
    assert_eq!(policy.stats().miss_count, 1);
}

/// A probation hit promotes and an overflowing protected demotes.
#[test]
fn promotion_and_demotion() {
    let mut policy = adaptive_policy();
    fill(&mut policy);
    // Keys 1..=5 were spilled to probation; promote three of them through
    // a protected segment that only holds two.
    for key in 1..=3 {
        policy.record(event(key, 1.0, 10.0));
    }
    assert_eq!(policy.segment_of(1), Some(Segment::Probation));
    assert_eq!(policy.segment_of(2), Some(Segment::Protected));
    assert_eq!(policy.segment_of(3), Some(Segment::Protected));
    policy.finished();
}

// ══════════════════════════════════════════════════════════
// 2. Window adaptation
// ══════════════════════════════════════════════════════════

/// The first closed sample flips the climber toward growth and the
/// window takes two entries from the protected quota.
#[test]
fn first_sample_grows_window() {
    let mut policy = adaptive_policy();
    fill(&mut policy);
    assert_eq!(policy.max_window(), 5);

    // Five full-cache hits close the first sample.
    for key in 6..=10 {
        policy.record(event(key, 1.0, 10.0));
    }
    assert_eq!(policy.max_window(), 7);
    assert_eq!(policy.max_protected(), 0);
    policy.finished();
}

/// A worsening penalty flips the direction and shrinks the window again.
#[test]
fn worsening_penalty_shrinks_window() {
    let mut policy = adaptive_policy();
    fill(&mut policy);
    for key in 6..=10 {
        policy.record(event(key, 1.0, 10.0));
    }
    assert_eq!(policy.max_window(), 7);

    // Five expensive full-cache misses close a sample whose average
    // penalty is far above the previous one.
    for key in 11..=15 {
        policy.record(event(key, 1.0, 100.0));
    }
    assert_eq!(policy.max_window(), 5);
    assert_eq!(policy.max_protected(), 2);
    policy.finished();
}

/// Growth stops once protected has nothing left to give.
#[test]
fn growth_is_capped_by_protected() {
    let mut policy = adaptive_policy();
    fill(&mut policy);
    for key in 6..=10 {
        policy.record(event(key, 1.0, 10.0));
    }
    assert_eq!(policy.max_protected(), 0);

    // Another steady sample keeps the increase direction, but there is
    // no protected quota left, so nothing moves.
    for key in 6..=10 {
        policy.record(event(key, 1.0, 10.0));
    }
    assert_eq!(policy.max_window(), 7);
    assert_eq!(policy.max_protected(), 0);
    policy.finished();
}

/// The net adaption is reported as a fraction of capacity.
#[test]
fn finished_reports_percent_adaption() {
    let mut policy = adaptive_policy();
    fill(&mut policy);
    for key in 6..=10 {
        policy.record(event(key, 1.0, 10.0));
    }
    policy.finished();
    let expected = 7.0 / 10.0 - 0.5;
    assert!((policy.stats().percent_adaption - expected).abs() < 1e-12);
}

// ══════════════════════════════════════════════════════════
// 3. Sampling guards
// ══════════════════════════════════════════════════════════

/// Nothing adapts while the cache is still filling.
#[test]
fn no_adaptation_before_full() {
    let mut policy = adaptive_policy();
    for key in 1..=9 {
        policy.record(event(key, 1.0, 10.0));
    }
    assert_eq!(policy.max_window(), 5);
    assert_eq!(policy.max_protected(), 2);
}

/// The estimation-accuracy stats see one observation per hit.
#[test]
fn hits_feed_accuracy_stats() {
    let mut policy = adaptive_policy();
    fill(&mut policy);
    policy.record(event(1, 1.0, 12.0));
    assert!((policy.stats().accuracy_mean() - 2.0).abs() < 1e-12);
}

/// NaN penalties and oversized weights are dropped without feeding the
/// climber.
#[test]
fn unrepresentable_events_are_dropped() {
    let mut policy = adaptive_policy();
    fill(&mut policy);
    for _ in 0..20 {
        policy.record(event(3, f64::NAN, 1.0));
    }
    assert_eq!(policy.max_window(), 5, "dropped events must not close samples");
    assert_eq!(policy.len(), 10);
}

// ══════════════════════════════════════════════════════════
// 4. Terminal checks
// ══════════════════════════════════════════════════════════

/// The terminal consistency checks pass after adaptation has moved
/// entries between every pair of segments.
#[test]
fn finished_accepts_adapted_state() {
    let mut policy = adaptive_policy();
    let penalties = [(1.0, 10.0), (1.0, 2.0), (0.5, 40.0)];
    for i in 0..600u64 {
        let (hit, miss) = penalties[(i % 3) as usize];
        policy.record(event(i % 17, hit, miss));
    }
    policy.finished();
}

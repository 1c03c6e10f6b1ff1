//! Single-block CRA policy tests.
//!
//! Replays the small deterministic scenarios through the full policy
//! (normalization, admission, stats) and checks the admission gate and
//! the unrepresentable-input handling.

use casim_core::admission::{AlwaysAdmit, LaTinyLfu, PerfectFrequency};
use casim_core::event::AccessEvent;
use casim_core::policy::{CraPolicy, Policy};

use crate::common::{event, replay, small_config};

/// Capacity-4 policy with admission bypassed.
fn policy_4() -> CraPolicy {
    CraPolicy::new(&small_config(4, 4), 1.0, Box::new(AlwaysAdmit))
}

// ══════════════════════════════════════════════════════════
// 1. Deterministic replay scenarios
// ══════════════════════════════════════════════════════════

/// Distinct keys fill the cache with no hits and no evictions.
#[test]
fn warmup_fills_without_eviction() {
    let mut policy = policy_4();
    replay(
        &mut policy,
        &[(1, 1.0, 10.0), (2, 1.0, 5.0), (3, 1.0, 1.0), (4, 1.0, 0.1)],
    );
    assert_eq!(policy.len(), 4);
    assert_eq!(policy.stats().hit_count, 0);
    assert_eq!(policy.stats().miss_count, 4);
    assert_eq!(policy.stats().eviction_count, 0);
    policy.finished();
}

/// A fifth key evicts the entry with the smallest delta.
#[test]
fn overflow_evicts_smallest_delta() {
    let mut policy = policy_4();
    replay(
        &mut policy,
        &[
            (1, 1.0, 10.0),
            (2, 1.0, 5.0),
            (3, 1.0, 1.0),
            (4, 1.0, 0.1),
            (5, 1.0, 20.0),
        ],
    );
    for key in [1, 2, 3, 5] {
        assert!(policy.contains(key));
    }
    assert!(!policy.contains(4));
    assert_eq!(policy.stats().eviction_count, 1);
    assert_eq!(policy.stats().hit_count, 0);
    policy.finished();
}

/// Re-accesses count as hits.
#[test]
fn repeats_count_as_hits() {
    let mut policy = policy_4();
    replay(&mut policy, &[(1, 1.0, 10.0); 3]);
    assert_eq!(policy.len(), 1);
    assert_eq!(policy.stats().hit_count, 2);
    assert_eq!(policy.stats().miss_count, 1);
}

/// A touch observing a negative delta discards the entry; the access is
/// serviced at miss cost and the removal counts as an eviction.
#[test]
fn negative_delta_touch_discards() {
    let mut policy = policy_4();
    replay(&mut policy, &[(1, 1.0, 10.0), (1, 1.0, 10.0), (1, 1.0, -5.0)]);
    assert!(policy.is_empty());
    assert_eq!(policy.stats().hit_count, 1);
    assert_eq!(policy.stats().miss_count, 2);
    assert_eq!(policy.stats().eviction_count, 1);
    policy.finished();
}

/// With equal deltas eviction degenerates to least-recently-touched.
#[test]
fn equal_deltas_evict_lru() {
    let mut policy = policy_4();
    for key in 1..=5 {
        policy.record(event(key, 1.0, 1.0));
    }
    assert_eq!(policy.len(), 4);
    assert!(!policy.contains(1));
    assert!(policy.contains(5));
    policy.finished();
}

// ══════════════════════════════════════════════════════════
// 2. Admission gate
// ══════════════════════════════════════════════════════════

/// A cold, low-benefit candidate loses against a hot incumbent and is
/// never inserted.
#[test]
fn cold_candidate_is_rejected() {
    let sketch = Box::new(PerfectFrequency::new());
    let mut policy = CraPolicy::new(&small_config(1, 4), 1.0, Box::new(LaTinyLfu::new(sketch)));

    policy.record(event(1, 1.0, 11.0));
    policy.record(event(1, 1.0, 11.0));
    policy.record(event(2, 1.0, 2.0));

    assert!(policy.contains(1));
    assert!(!policy.contains(2));
    assert_eq!(policy.stats().rejected_count, 1);
    assert_eq!(policy.stats().eviction_count, 0);
    assert_eq!(policy.stats().miss_count, 2);
    policy.finished();
}

/// A hot, high-benefit candidate wins the arbitration.
#[test]
fn hot_candidate_is_admitted() {
    let sketch = Box::new(PerfectFrequency::new());
    let mut policy = CraPolicy::new(&small_config(1, 4), 1.0, Box::new(LaTinyLfu::new(sketch)));

    policy.record(event(1, 1.0, 2.0));
    policy.record(event(2, 1.0, 11.0));
    policy.record(event(2, 1.0, 11.0));

    assert!(policy.contains(2));
    assert!(!policy.contains(1));
    assert_eq!(policy.stats().admitted_count, 1);
    assert_eq!(policy.stats().eviction_count, 1);
    policy.finished();
}

// ══════════════════════════════════════════════════════════
// 3. Unrepresentable input
// ══════════════════════════════════════════════════════════

/// NaN penalties are dropped with only the operation counter bumped.
#[test]
fn nan_penalties_are_dropped() {
    let mut policy = policy_4();
    policy.record(event(1, f64::NAN, 5.0));
    policy.record(event(2, 1.0, f64::NAN));
    assert!(policy.is_empty());
    assert_eq!(policy.stats().operation_count, 2);
    assert_eq!(policy.stats().miss_count, 0);
}

/// Weights beyond the capacity are dropped the same way.
#[test]
fn oversized_weight_is_dropped() {
    let mut policy = policy_4();
    policy.record(AccessEvent::with_weight(1, 9, 1.0, 10.0));
    assert!(policy.is_empty());
    assert_eq!(policy.stats().operation_count, 1);
    assert_eq!(policy.stats().miss_count, 0);
}

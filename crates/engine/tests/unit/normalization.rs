//! Normalization estimator tests.
//!
//! Pins the bias (smallest non-negative delta) and factor (windowed mean
//! of large deltas) behavior, including the publish cadence.

use casim_core::policy::{CraBlock, Normalizer};

/// The first large delta publishes the factor immediately.
#[test]
fn first_sample_publishes_factor() {
    let mut normalizer = Normalizer::new();
    normalizer.on_miss(10.0);
    assert_eq!(normalizer.factor(), 10.0);
    assert_eq!(normalizer.bias(), 10.0);
}

/// The bias drops to the smallest non-negative delta seen.
#[test]
fn bias_tracks_minimum() {
    let mut normalizer = Normalizer::new();
    normalizer.on_miss(10.0);
    normalizer.on_miss(2.0);
    assert_eq!(normalizer.bias(), 2.0);
    assert_eq!(normalizer.factor(), 10.0);
}

/// A negative delta clamps the candidate bias to zero, and a zero bias
/// is replaced outright by the next observation.
#[test]
fn zero_bias_is_replaced() {
    let mut normalizer = Normalizer::new();
    normalizer.on_miss(-3.0);
    assert_eq!(normalizer.bias(), 0.0);
    normalizer.on_miss(4.0);
    assert_eq!(normalizer.bias(), 4.0);
}

/// Deltas below the current factor do not move it.
#[test]
fn small_deltas_leave_factor_alone() {
    let mut normalizer = Normalizer::new();
    normalizer.on_miss(10.0);
    for _ in 0..50 {
        normalizer.on_miss(3.0);
    }
    assert_eq!(normalizer.factor(), 10.0);
}

/// The factor is republished from the running mean after a thousand
/// large samples.
#[test]
fn factor_republishes_after_thousand_samples() {
    let mut normalizer = Normalizer::new();
    normalizer.on_miss(10.0);
    for _ in 0..999 {
        normalizer.on_miss(20.0);
    }
    assert_eq!(normalizer.factor(), 10.0, "republish only at the boundary");

    normalizer.on_miss(20.0);
    assert!(normalizer.factor() > 10.0);
    assert!(normalizer.factor() < 20.0);
}

/// Publishing pushes the pair into a block.
#[test]
fn apply_to_updates_block() {
    let mut normalizer = Normalizer::new();
    normalizer.on_miss(10.0);
    normalizer.on_miss(2.0);

    let mut block = CraBlock::new(1.0, 4, 8);
    normalizer.apply_to(&mut block);
    // bias 2, factor 10: delta 2 maps to the bottom bucket, delta 10 to
    // the top.
    assert_eq!(block.bucket_index(2.0), 1);
    assert_eq!(block.bucket_index(10.0), 4);
}

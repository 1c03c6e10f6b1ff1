//! Hill climber tests.
//!
//! Drives the climbers directly through their sampling interface and
//! checks the direction logic, the decay/freeze behavior, and the Adam
//! and Nadam step algebra against hand-computed values.

use casim_core::config::{ClimberConfig, ClimberStrategy, Config};
use casim_core::policy::climb::{Adaptation, HillClimber};
use casim_core::policy::Segment;

use crate::common::event;

/// A simple-climber config with a 5-request sample, a 1-entry step, and
/// no decay or restarts.
fn simple_config() -> ClimberConfig {
    let mut climber = Config::default().climber;
    climber.strategy = ClimberStrategy::Simple;
    climber.percent_sample = 0.5;
    climber.percent_pivot = 0.1;
    climber.simple.step_decay_rate = 1.0;
    climber.simple.sample_decay_rate = 1.0;
    climber.simple.restart_threshold = 2.0;
    climber
}

/// Feeds `count` full-cache misses with the given penalty.
fn feed_misses(climber: &mut HillClimber, count: usize, miss_penalty: f64) {
    for _ in 0..count {
        climber.on_miss(&event(1, 0.0, miss_penalty), true);
    }
}

fn adapt(climber: &mut HillClimber) -> Adaptation {
    climber.adapt(5.0, 3.0, 2.0, true)
}

// ══════════════════════════════════════════════════════════
// 1. Sampling guards
// ══════════════════════════════════════════════════════════

/// Nothing adapts before the cache is full.
#[test]
fn holds_while_not_full() {
    let mut climber = HillClimber::new(&simple_config(), 10);
    feed_misses(&mut climber, 50, 1.0);
    assert_eq!(climber.adapt(5.0, 3.0, 2.0, false), Adaptation::Hold);
}

/// Nothing adapts before a full sample is collected.
#[test]
fn holds_until_sample_completes() {
    let mut climber = HillClimber::new(&simple_config(), 10);
    feed_misses(&mut climber, 4, 1.0);
    assert_eq!(adapt(&mut climber), Adaptation::Hold);
}

/// Events seen while the cache is filling do not count toward the
/// sample.
#[test]
fn not_full_events_are_ignored() {
    let mut climber = HillClimber::new(&simple_config(), 10);
    for _ in 0..100 {
        climber.on_miss(&event(1, 0.0, 1.0), false);
        climber.on_hit(&event(1, 1.0, 2.0), Segment::Window, false);
    }
    assert_eq!(adapt(&mut climber), Adaptation::Hold);
}

// ══════════════════════════════════════════════════════════
// 2. Simple climber direction logic
// ══════════════════════════════════════════════════════════

/// The first closed sample flips the initial direction to growth.
#[test]
fn simple_first_sample_increases() {
    let mut climber = HillClimber::new(&simple_config(), 10);
    feed_misses(&mut climber, 5, 1.0);
    match adapt(&mut climber) {
        Adaptation::IncreaseWindow(step) => assert!((step - 1.0).abs() < 1e-12),
        other => panic!("expected growth, got {other:?}"),
    }
}

/// A steady penalty keeps the walking direction.
#[test]
fn simple_steady_penalty_keeps_direction() {
    let mut climber = HillClimber::new(&simple_config(), 10);
    feed_misses(&mut climber, 5, 1.0);
    adapt(&mut climber);
    feed_misses(&mut climber, 5, 1.0);
    assert!(matches!(adapt(&mut climber), Adaptation::IncreaseWindow(_)));
}

/// A penalty increase beyond the tolerance flips the direction.
#[test]
fn simple_worsening_penalty_flips_direction() {
    let mut climber = HillClimber::new(&simple_config(), 10);
    feed_misses(&mut climber, 5, 1.0);
    adapt(&mut climber);
    feed_misses(&mut climber, 5, 5.0);
    match adapt(&mut climber) {
        Adaptation::DecreaseWindow(step) => assert!((step - 1.0).abs() < 1e-12),
        other => panic!("expected shrink, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════
// 3. Decay and freeze
// ══════════════════════════════════════════════════════════

/// Once the sample size decays through its floor the climber freezes for
/// good.
#[test]
fn sample_decay_freezes_adaptation() {
    let mut config = simple_config();
    config.simple.sample_decay_rate = 0.1;
    let mut climber = HillClimber::new(&config, 10);

    feed_misses(&mut climber, 5, 1.0);
    assert!(matches!(adapt(&mut climber), Adaptation::IncreaseWindow(_)));

    feed_misses(&mut climber, 200, 1.0);
    assert_eq!(adapt(&mut climber), Adaptation::Hold);
}

/// A step size decayed through its floor freezes the climber too.
#[test]
fn step_decay_freezes_adaptation() {
    let mut config = simple_config();
    config.simple.step_decay_rate = 0.001;
    let mut climber = HillClimber::new(&config, 10);

    feed_misses(&mut climber, 5, 1.0);
    assert!(matches!(adapt(&mut climber), Adaptation::IncreaseWindow(_)));

    feed_misses(&mut climber, 200, 1.0);
    assert_eq!(adapt(&mut climber), Adaptation::Hold);
}

// ══════════════════════════════════════════════════════════
// 4. Gradient climbers
// ══════════════════════════════════════════════════════════

fn gradient_config(strategy: ClimberStrategy) -> ClimberConfig {
    let mut climber = Config::default().climber;
    climber.strategy = strategy;
    climber.percent_sample = 0.5;
    climber.percent_pivot = 0.1;
    climber
}

/// Adam's first step reduces to step_size * g / (|g| + eps) after bias
/// correction: with g = 2 and step 1 the step is about 1.
#[test]
fn adam_first_step_matches_algebra() {
    let mut climber = HillClimber::new(&gradient_config(ClimberStrategy::Adam), 10);
    feed_misses(&mut climber, 5, 2.0);
    match adapt(&mut climber) {
        Adaptation::IncreaseWindow(step) => assert!((step - 1.0).abs() < 1e-6),
        other => panic!("expected growth, got {other:?}"),
    }
}

/// Nadam's first step adds the Nesterov term: with g = 2 and step 1 the
/// step is 1/(2)*(0.9*2 + 1.0*2) = 1.9.
#[test]
fn nadam_first_step_matches_algebra() {
    let mut climber = HillClimber::new(&gradient_config(ClimberStrategy::Nadam), 10);
    feed_misses(&mut climber, 5, 2.0);
    match adapt(&mut climber) {
        Adaptation::IncreaseWindow(step) => assert!((step - 1.9).abs() < 1e-6),
        other => panic!("expected growth, got {other:?}"),
    }
}

/// Without momentum a falling average penalty produces a shrink step.
#[test]
fn adam_negative_gradient_shrinks() {
    let mut config = gradient_config(ClimberStrategy::Adam);
    config.adam.beta1 = 0.0;
    config.adam.beta2 = 0.0;
    let mut climber = HillClimber::new(&config, 10);

    feed_misses(&mut climber, 5, 2.0);
    assert!(matches!(adapt(&mut climber), Adaptation::IncreaseWindow(_)));

    feed_misses(&mut climber, 5, 1.0);
    match adapt(&mut climber) {
        Adaptation::DecreaseWindow(step) => assert!((step - 1.0).abs() < 1e-6),
        other => panic!("expected shrink, got {other:?}"),
    }
}

//! Replacement policies.
//!
//! Implements the latency-aware eviction policies the simulator replays
//! traces against.
//!
//! # Policies
//!
//! - `CraPolicy`: a single benefit-bucketed block with admission.
//! - `WindowCaPolicy`: window + probation + protected segments with
//!   TinyLFU admission.
//! - `AdaptiveCaPolicy`: the segmented cache with a hill climber resizing
//!   the window online.

/// Windowed TinyLFU with online window sizing.
pub mod adaptive_ca;

/// The benefit-bucketed eviction store.
pub mod block;

/// Hill climbers for the adaptive policy.
pub mod climb;

/// Single-block CRA policy.
pub mod cra;

/// Delta normalization shared across a policy's blocks.
pub mod normalization;

/// Latency-aware windowed TinyLFU.
pub mod window_ca;

pub use adaptive_ca::AdaptiveCaPolicy;
pub use block::CraBlock;
pub use cra::CraPolicy;
pub use normalization::Normalizer;
pub use window_ca::WindowCaPolicy;

use crate::admission::build_admittor;
use crate::config::{Config, PolicyChoice};
use crate::error::SimError;
use crate::event::AccessEvent;
use crate::stats::PolicyStats;

/// The cache region a resident key lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    /// The admission window.
    Window,
    /// Main region, not yet re-referenced.
    Probation,
    /// Main region, re-referenced at least once.
    Protected,
}

/// Trait for trace-replay cache policies.
///
/// One event is processed to completion before the next arrives; a policy
/// never blocks and never fails on normal input.
pub trait Policy {
    /// Replays one trace event.
    fn record(&mut self, event: AccessEvent);

    /// Runs terminal consistency checks after the trace is exhausted.
    ///
    /// # Panics
    ///
    /// Panics when internal bookkeeping disagrees with the resident data,
    /// which is a bug in the policy, not in the trace.
    fn finished(&mut self);

    /// The statistics gathered so far.
    fn stats(&self) -> &PolicyStats;
}

/// Builds every policy instance a configuration asks for.
///
/// One instance is created per `(policy, k)` pair so a single replay can
/// sweep the rank exponent.
pub fn build_policies(config: &Config) -> Result<Vec<Box<dyn Policy>>, SimError> {
    if config.maximum_size == 0 {
        return Err(SimError::Config("maximum_size must be positive".into()));
    }
    if config.policies.is_empty() {
        return Err(SimError::Config("no policies selected".into()));
    }
    if !(0.0..=1.0).contains(&config.window.percent_main) {
        return Err(SimError::Config(format!(
            "percent_main {} outside [0, 1]",
            config.window.percent_main
        )));
    }
    if !(0.0..=1.0).contains(&config.window.percent_main_protected) {
        return Err(SimError::Config(format!(
            "percent_main_protected {} outside [0, 1]",
            config.window.percent_main_protected
        )));
    }
    if config.cra.k_values.is_empty() {
        return Err(SimError::Config("k_values must not be empty".into()));
    }

    let mut policies: Vec<Box<dyn Policy>> = Vec::new();
    for &choice in &config.policies {
        for &k in &config.cra.k_values {
            let admittor = build_admittor(&config.sketch, config.maximum_size);
            policies.push(match choice {
                PolicyChoice::Cra => Box::new(CraPolicy::new(config, k, admittor)),
                PolicyChoice::WindowCa => Box::new(WindowCaPolicy::new(config, k, admittor)),
                PolicyChoice::AdaptiveCa => Box::new(AdaptiveCaPolicy::new(config, k, admittor)),
            });
        }
    }
    Ok(policies)
}

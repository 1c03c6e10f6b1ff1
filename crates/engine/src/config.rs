//! Configuration system for the cache simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize a simulation run. It provides:
//! 1. **Defaults:** Baseline constants (capacity, bucket count, climber and
//!    sketch hyperparameters).
//! 2. **Structures:** Hierarchical config for the policy set, the CRA block,
//!    the window split, the hill climber, and the admission sketch.
//! 3. **Enums:** Policy family, climber strategy, and sketch type.
//!
//! Configuration is supplied as JSON (via the CLI `--config` flag) or built
//! with `Config::default()`. It is immutable for the duration of a run.

use serde::Deserialize;

/// Default configuration constants for the simulator.
mod defaults {
    /// Default total cache capacity (entries, or weight units for the
    /// single-block policy).
    pub const MAXIMUM_SIZE: usize = 512;

    /// Default CRA rank exponent.
    pub const K: f64 = 1.0;

    /// Default number of non-negative-delta buckets per block.
    pub const MAX_LISTS: usize = 10;

    /// Default main-region share of total capacity (window gets the rest).
    pub const PERCENT_MAIN: f64 = 0.99;

    /// Default protected share of the main region.
    pub const PERCENT_MAIN_PROTECTED: f64 = 0.8;

    /// Default initial climber step size as a fraction of capacity.
    pub const PERCENT_PIVOT: f64 = 0.005;

    /// Default climber sample period as a fraction of capacity.
    pub const PERCENT_SAMPLE: f64 = 10.0;

    /// Default Adam/Nadam first-moment decay.
    pub const BETA1: f64 = 0.9;

    /// Default Adam/Nadam second-moment decay.
    pub const BETA2: f64 = 0.999;

    /// Default Adam/Nadam numerical-stability term.
    pub const EPSILON: f64 = 1e-8;

    /// Default relative penalty increase that flips the simple climber's
    /// direction.
    pub const TOLERANCE: f64 = 0.01;

    /// Default per-sample decay of the simple climber's step size.
    pub const STEP_DECAY_RATE: f64 = 0.98;

    /// Default per-sample decay of the simple climber's sample size.
    pub const SAMPLE_DECAY_RATE: f64 = 1.0;

    /// Default relative penalty change that restarts the simple climber.
    pub const RESTART_THRESHOLD: f64 = 0.05;

    /// Default count-min reset budget as a multiple of capacity.
    pub const SKETCH_SAMPLE_FACTOR: usize = 10;
}

/// Cache policy families the simulator can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyChoice {
    /// A single benefit-bucketed block with latency-aware admission.
    Cra,
    /// Window + probation + protected segments with TinyLFU admission.
    #[default]
    WindowCa,
    /// `WindowCa` plus a hill climber resizing the window online.
    AdaptiveCa,
}

/// Hill-climbing strategies for the adaptive policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClimberStrategy {
    /// Direction-flipping climber with decaying step and sample sizes.
    #[default]
    Simple,
    /// Adaptive moment estimation over the average-penalty gradient.
    Adam,
    /// Adam with Nesterov momentum.
    Nadam,
}

/// Frequency estimator behind the TinyLFU admittor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SketchType {
    /// 4-bit count-min sketch with periodic halving.
    #[default]
    #[serde(alias = "count-min-4")]
    CountMin4,
    /// Exact per-key counters (unbounded memory; reference results).
    Perfect,
    /// Bypass admission entirely; every candidate wins.
    AlwaysAdmit,
}

/// Root configuration for one simulation run.
///
/// # Examples
///
/// Deserializing from JSON (typical CLI usage):
///
/// ```
/// use casim_core::config::{ClimberStrategy, Config, PolicyChoice};
///
/// let json = r#"{
///     "maximum_size": 1024,
///     "policies": ["window-ca", "adaptive-ca"],
///     "cra": { "k_values": [1.0, 2.0], "max_lists": 8 },
///     "window": { "percent_main": 0.95, "percent_main_protected": 0.75 },
///     "climber": { "strategy": "nadam", "percent_sample": 5.0 },
///     "sketch": { "kind": "count-min-4", "sample_factor": 8 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.maximum_size, 1024);
/// assert_eq!(config.policies, vec![PolicyChoice::WindowCa, PolicyChoice::AdaptiveCa]);
/// assert_eq!(config.climber.strategy, ClimberStrategy::Nadam);
/// assert_eq!(config.cra.max_lists, 8);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Total cache capacity.
    #[serde(default = "Config::default_maximum_size")]
    pub maximum_size: usize,

    /// Policy families to replay the trace against.
    #[serde(default = "Config::default_policies")]
    pub policies: Vec<PolicyChoice>,

    /// CRA block parameters.
    #[serde(default)]
    pub cra: CraConfig,

    /// Window/main split for the segmented policies.
    #[serde(default)]
    pub window: WindowConfig,

    /// Hill climber parameters for the adaptive policy.
    #[serde(default)]
    pub climber: ClimberConfig,

    /// Admission sketch selection.
    #[serde(default)]
    pub sketch: SketchConfig,
}

impl Config {
    /// Returns the default total capacity.
    fn default_maximum_size() -> usize {
        defaults::MAXIMUM_SIZE
    }

    /// Returns the default policy set.
    fn default_policies() -> Vec<PolicyChoice> {
        vec![PolicyChoice::default()]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            maximum_size: defaults::MAXIMUM_SIZE,
            policies: Self::default_policies(),
            cra: CraConfig::default(),
            window: WindowConfig::default(),
            climber: ClimberConfig::default(),
            sketch: SketchConfig::default(),
        }
    }
}

/// Parameters of the benefit-bucketed replacement block.
#[derive(Debug, Clone, Deserialize)]
pub struct CraConfig {
    /// Rank exponents to instantiate; one policy instance is built per
    /// value, so a run can sweep the recency/benefit trade-off.
    #[serde(default = "CraConfig::default_k_values")]
    pub k_values: Vec<f64>,

    /// Number of non-negative-delta buckets per block.
    #[serde(default = "CraConfig::default_max_lists")]
    pub max_lists: usize,
}

impl CraConfig {
    /// Returns the default rank exponent list.
    fn default_k_values() -> Vec<f64> {
        vec![defaults::K]
    }

    /// Returns the default bucket count.
    fn default_max_lists() -> usize {
        defaults::MAX_LISTS
    }
}

impl Default for CraConfig {
    fn default() -> Self {
        Self {
            k_values: Self::default_k_values(),
            max_lists: Self::default_max_lists(),
        }
    }
}

/// Segment sizing for the window policies.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// Share of total capacity given to the main (probation + protected)
    /// region; the admission window gets the remainder.
    #[serde(default = "WindowConfig::default_percent_main")]
    pub percent_main: f64,

    /// Share of the main region reserved for the protected segment.
    #[serde(default = "WindowConfig::default_percent_main_protected")]
    pub percent_main_protected: f64,
}

impl WindowConfig {
    /// Returns the default main-region share.
    fn default_percent_main() -> f64 {
        defaults::PERCENT_MAIN
    }

    /// Returns the default protected share of main.
    fn default_percent_main_protected() -> f64 {
        defaults::PERCENT_MAIN_PROTECTED
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            percent_main: Self::default_percent_main(),
            percent_main_protected: Self::default_percent_main_protected(),
        }
    }
}

/// Hill climber configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClimberConfig {
    /// Which climbing strategy to use.
    #[serde(default)]
    pub strategy: ClimberStrategy,

    /// Initial step size as a fraction of capacity.
    #[serde(default = "ClimberConfig::default_percent_pivot")]
    pub percent_pivot: f64,

    /// Sample period as a fraction of capacity.
    #[serde(default = "ClimberConfig::default_percent_sample")]
    pub percent_sample: f64,

    /// Adam/Nadam hyperparameters.
    #[serde(default)]
    pub adam: AdamConfig,

    /// Simple climber hyperparameters.
    #[serde(default)]
    pub simple: SimpleClimberConfig,
}

impl ClimberConfig {
    /// Returns the default initial step fraction.
    fn default_percent_pivot() -> f64 {
        defaults::PERCENT_PIVOT
    }

    /// Returns the default sample period fraction.
    fn default_percent_sample() -> f64 {
        defaults::PERCENT_SAMPLE
    }
}

impl Default for ClimberConfig {
    fn default() -> Self {
        Self {
            strategy: ClimberStrategy::default(),
            percent_pivot: Self::default_percent_pivot(),
            percent_sample: Self::default_percent_sample(),
            adam: AdamConfig::default(),
            simple: SimpleClimberConfig::default(),
        }
    }
}

/// Gradient-optimizer hyperparameters shared by Adam and Nadam.
#[derive(Debug, Clone, Deserialize)]
pub struct AdamConfig {
    /// First-moment decay rate.
    #[serde(default = "AdamConfig::default_beta1")]
    pub beta1: f64,

    /// Second-moment decay rate.
    #[serde(default = "AdamConfig::default_beta2")]
    pub beta2: f64,

    /// Denominator stabilizer.
    #[serde(default = "AdamConfig::default_epsilon")]
    pub epsilon: f64,
}

impl AdamConfig {
    /// Returns the default first-moment decay rate.
    fn default_beta1() -> f64 {
        defaults::BETA1
    }

    /// Returns the default second-moment decay rate.
    fn default_beta2() -> f64 {
        defaults::BETA2
    }

    /// Returns the default denominator stabilizer.
    fn default_epsilon() -> f64 {
        defaults::EPSILON
    }
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta1: Self::default_beta1(),
            beta2: Self::default_beta2(),
            epsilon: Self::default_epsilon(),
        }
    }
}

/// Simple climber hyperparameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SimpleClimberConfig {
    /// Relative penalty increase that flips the climbing direction.
    #[serde(default = "SimpleClimberConfig::default_tolerance")]
    pub tolerance: f64,

    /// Per-sample multiplier applied to the step size.
    #[serde(default = "SimpleClimberConfig::default_step_decay_rate")]
    pub step_decay_rate: f64,

    /// Per-sample multiplier applied to the sample size.
    #[serde(default = "SimpleClimberConfig::default_sample_decay_rate")]
    pub sample_decay_rate: f64,

    /// Relative penalty change that restores the initial step and sample
    /// sizes.
    #[serde(default = "SimpleClimberConfig::default_restart_threshold")]
    pub restart_threshold: f64,
}

impl SimpleClimberConfig {
    /// Returns the default direction-flip tolerance.
    fn default_tolerance() -> f64 {
        defaults::TOLERANCE
    }

    /// Returns the default step decay rate.
    fn default_step_decay_rate() -> f64 {
        defaults::STEP_DECAY_RATE
    }

    /// Returns the default sample decay rate.
    fn default_sample_decay_rate() -> f64 {
        defaults::SAMPLE_DECAY_RATE
    }

    /// Returns the default restart threshold.
    fn default_restart_threshold() -> f64 {
        defaults::RESTART_THRESHOLD
    }
}

impl Default for SimpleClimberConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::default_tolerance(),
            step_decay_rate: Self::default_step_decay_rate(),
            sample_decay_rate: Self::default_sample_decay_rate(),
            restart_threshold: Self::default_restart_threshold(),
        }
    }
}

/// Admission sketch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SketchConfig {
    /// Which frequency estimator to build.
    #[serde(default)]
    pub kind: SketchType,

    /// Count-min reset budget as a multiple of capacity.
    #[serde(default = "SketchConfig::default_sample_factor")]
    pub sample_factor: usize,
}

impl SketchConfig {
    /// Returns the default count-min reset budget multiplier.
    fn default_sample_factor() -> usize {
        defaults::SKETCH_SAMPLE_FACTOR
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            kind: SketchType::default(),
            sample_factor: Self::default_sample_factor(),
        }
    }
}

//! Direction-flipping hill climber.
//!
//! Walks the window size in one direction with a decaying step. When a
//! sample's average penalty worsens past the tolerance, the direction
//! flips. A large relative change in either direction restores the
//! initial step and sample sizes so the climber can chase a regime shift;
//! once the step or the sample size decays below its floor, adaptation
//! freezes.

/// Sample size sentinel that stops further adaptation.
const FROZEN: u64 = u64::MAX;

/// Step floor below which the climber freezes.
const MIN_STEP: f64 = 0.01;

use crate::config::SimpleClimberConfig;

/// Mutable state of the simple climber.
pub struct SimpleState {
    initial_step_size: f64,
    initial_sample_size: u64,
    step_size: f64,
    tolerance: f64,
    step_decay_rate: f64,
    sample_decay_rate: f64,
    restart_threshold: f64,
    increase_window: bool,
}

impl SimpleState {
    pub fn new(config: &SimpleClimberConfig, step_size: f64, sample_size: u64) -> Self {
        Self {
            initial_step_size: step_size,
            initial_sample_size: sample_size,
            step_size,
            tolerance: config.tolerance,
            step_decay_rate: config.step_decay_rate,
            sample_decay_rate: config.sample_decay_rate,
            restart_threshold: config.restart_threshold,
            increase_window: false,
        }
    }

    /// The sample size a restart reverts to.
    pub fn initial_sample_size(&self) -> u64 {
        self.initial_sample_size
    }

    /// The current walking direction.
    pub fn is_increasing(&self) -> bool {
        self.increase_window
    }

    /// Produces the signed step for a closed sample.
    ///
    /// Returns `(step, restart)`; `restart` asks the owner to also reset
    /// its sample size to the initial value.
    pub fn adjust(&mut self, avg_penalty: f64, previous_avg_penalty: f64) -> (f64, bool) {
        if avg_penalty / previous_avg_penalty > 1.0 + self.tolerance {
            self.increase_window = !self.increase_window;
        }
        let ratio = avg_penalty.min(previous_avg_penalty) / avg_penalty.max(previous_avg_penalty);
        let restart = 1.0 - ratio.abs() >= self.restart_threshold;
        if restart {
            self.step_size = self.initial_step_size;
        }
        let step = if self.increase_window {
            self.step_size
        } else {
            -self.step_size
        };
        (step, restart)
    }

    /// Decays the step and sample sizes at the end of a sample period.
    ///
    /// Returns the new sample size, or [`FROZEN`] once either quantity
    /// falls below its floor.
    pub fn decay(&mut self, sample_size: u64) -> u64 {
        self.step_size *= self.step_decay_rate;
        let decayed = if sample_size == FROZEN {
            FROZEN
        } else {
            (sample_size as f64 * self.sample_decay_rate) as u64
        };
        if self.step_size <= MIN_STEP || decayed <= 1 {
            FROZEN
        } else {
            decayed
        }
    }
}

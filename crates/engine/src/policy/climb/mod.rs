//! Hill climbers for online window sizing.
//!
//! The adaptive policy samples the average service penalty over a window
//! of requests and asks a climber which way to move the admission window.
//! Three strategies share one sampling skeleton:
//!
//! - `Simple`: walk in one direction, flip when the penalty worsens.
//! - `Adam`: first/second-moment gradient steps over the penalty delta.
//! - `Nadam`: Adam with Nesterov momentum.

/// Adam and Nadam gradient steps.
pub mod gradient;

/// The direction-flipping simple climber.
pub mod simple;

use crate::config::{ClimberConfig, ClimberStrategy};
use crate::event::AccessEvent;

use self::gradient::GradientState;
use self::simple::SimpleState;

use super::Segment;

/// A climber's verdict for the current sample period.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adaptation {
    /// Keep the current split.
    Hold,
    /// Grow the window by the given number of entries.
    IncreaseWindow(f64),
    /// Shrink the window by the given number of entries.
    DecreaseWindow(f64),
}

impl Adaptation {
    /// Maps a signed step to a directional adaptation.
    fn adapt_by(amount: f64) -> Self {
        if amount > 0.0 {
            Adaptation::IncreaseWindow(amount)
        } else if amount < 0.0 {
            Adaptation::DecreaseWindow(-amount)
        } else {
            Adaptation::Hold
        }
    }
}

/// Strategy-specific state behind the shared sampling skeleton.
pub enum ClimberKind {
    Simple(SimpleState),
    Adam(GradientState),
    Nadam(GradientState),
}

/// Penalty-driven window-size controller.
///
/// Accumulates per-request penalties while the cache is full; once a full
/// sample is collected, the strategy turns the average penalty into a
/// signed window adjustment and the sample restarts.
pub struct HillClimber {
    sample_size: u64,
    sample_count: u64,
    penalties_in_sample: f64,
    penalties_in_window: f64,
    penalties_in_main: f64,
    previous_avg_penalty: f64,
    kind: ClimberKind,
}

impl HillClimber {
    /// Builds the configured strategy sized for a cache of
    /// `maximum_size` entries.
    pub fn new(config: &ClimberConfig, maximum_size: usize) -> Self {
        let sample_size = ((config.percent_sample * maximum_size as f64) as u64).max(1);
        let step_size = config.percent_pivot * maximum_size as f64;
        let kind = match config.strategy {
            ClimberStrategy::Simple => ClimberKind::Simple(SimpleState::new(
                &config.simple,
                step_size,
                sample_size,
            )),
            ClimberStrategy::Adam => ClimberKind::Adam(GradientState::new(&config.adam, step_size)),
            ClimberStrategy::Nadam => {
                ClimberKind::Nadam(GradientState::new(&config.adam, step_size))
            }
        };
        Self {
            sample_size,
            sample_count: 0,
            penalties_in_sample: 0.0,
            penalties_in_window: 0.0,
            penalties_in_main: 0.0,
            previous_avg_penalty: 0.0,
            kind,
        }
    }

    /// Accumulates a miss penalty into the running sample.
    ///
    /// Samples are only meaningful once the cache is full; before that the
    /// split is still filling and penalties say nothing about it.
    pub fn on_miss(&mut self, event: &AccessEvent, is_full: bool) {
        if is_full {
            self.sample_count += 1;
            self.penalties_in_sample += event.miss_penalty();
        }
    }

    /// Accumulates a hit penalty, split by the segment that served it.
    pub fn on_hit(&mut self, event: &AccessEvent, segment: Segment, is_full: bool) {
        if is_full {
            self.sample_count += 1;
            self.penalties_in_sample += event.hit_penalty();
            if segment == Segment::Window {
                self.penalties_in_window += event.hit_penalty();
            } else {
                self.penalties_in_main += event.hit_penalty();
            }
        }
    }

    /// Closes the sample period if it is complete and returns the verdict.
    ///
    /// # Panics
    ///
    /// Panics when the sample size has decayed to zero; the decay floor in
    /// the simple climber freezes at `u64::MAX` instead, so a zero here is
    /// a construction bug.
    pub fn adapt(
        &mut self,
        window_size: f64,
        _probation_size: f64,
        _protected_size: f64,
        is_full: bool,
    ) -> Adaptation {
        if !is_full {
            return Adaptation::Hold;
        }
        assert!(self.sample_size > 0, "sample size may not be zero");
        if self.sample_count < self.sample_size {
            return Adaptation::Hold;
        }

        let avg_penalty = self.penalties_in_sample / self.sample_count as f64;
        let amount = self.adjust(avg_penalty);
        log::trace!(
            "climber sample closed: avg_penalty={avg_penalty:.4} window={window_size:.1} \
             hit_penalties={:.1}/{:.1} (window/main) step={amount:.3}",
            self.penalties_in_window,
            self.penalties_in_main
        );
        self.reset_sample(avg_penalty);
        Adaptation::adapt_by(amount)
    }

    /// Turns the closed sample's average penalty into a signed step.
    fn adjust(&mut self, avg_penalty: f64) -> f64 {
        let previous = self.previous_avg_penalty;
        match &mut self.kind {
            ClimberKind::Simple(state) => {
                let (step, restart) = state.adjust(avg_penalty, previous);
                if restart {
                    self.sample_size = state.initial_sample_size();
                }
                step
            }
            ClimberKind::Adam(state) => state.adam_step(avg_penalty - previous),
            ClimberKind::Nadam(state) => state.nadam_step(avg_penalty - previous),
        }
    }

    /// Starts the next sample period.
    fn reset_sample(&mut self, avg_penalty: f64) {
        self.previous_avg_penalty = avg_penalty;
        self.sample_count = 0;
        self.penalties_in_sample = 0.0;
        self.penalties_in_window = 0.0;
        self.penalties_in_main = 0.0;
        match &mut self.kind {
            ClimberKind::Simple(state) => {
                self.sample_size = state.decay(self.sample_size);
            }
            ClimberKind::Adam(state) | ClimberKind::Nadam(state) => state.advance(),
        }
    }
}

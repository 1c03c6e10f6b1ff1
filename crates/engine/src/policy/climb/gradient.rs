//! Gradient-descent window climbers.
//!
//! Both strategies treat the change in average penalty between sample
//! periods as a gradient and take first/second-moment steps on it:
//!
//! ```text
//! m_t = b1*m + (1-b1)*g         v_t = b2*v + (1-b2)*g^2
//! m^  = m_t / (1 - b1^t)        v^  = v_t / (1 - b2^t)
//! Adam:  step/(sqrt(v^)+eps) * m^
//! Nadam: step/(sqrt(v^)+eps) * (b1*m^ + (1-b1)/(1-b1^t) * g)
//! ```

use crate::config::AdamConfig;

/// Shared first/second-moment optimizer state.
pub struct GradientState {
    step_size: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    moment: f64,
    velocity: f64,
}

impl GradientState {
    pub fn new(config: &AdamConfig, step_size: f64) -> Self {
        Self {
            step_size,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
            t: 1,
            moment: 0.0,
            velocity: 0.0,
        }
    }

    /// Folds the gradient into the moment estimates and returns the
    /// bias-corrected pair `(m^, v^)`.
    fn moments(&mut self, gradient: f64) -> (f64, f64) {
        self.moment = self.beta1 * self.moment + (1.0 - self.beta1) * gradient;
        self.velocity = self.beta2 * self.velocity + (1.0 - self.beta2) * gradient * gradient;
        let moment_bias = self.moment / (1.0 - self.beta1.powi(self.t));
        let velocity_bias = self.velocity / (1.0 - self.beta2.powi(self.t));
        (moment_bias, velocity_bias)
    }

    /// One Adam step on the penalty gradient.
    pub fn adam_step(&mut self, gradient: f64) -> f64 {
        let (moment_bias, velocity_bias) = self.moments(gradient);
        self.step_size / (velocity_bias.sqrt() + self.epsilon) * moment_bias
    }

    /// One Nadam step: Adam with the Nesterov look-ahead term.
    pub fn nadam_step(&mut self, gradient: f64) -> f64 {
        let (moment_bias, velocity_bias) = self.moments(gradient);
        let nesterov =
            self.beta1 * moment_bias + (1.0 - self.beta1) / (1.0 - self.beta1.powi(self.t)) * gradient;
        self.step_size / (velocity_bias.sqrt() + self.epsilon) * nesterov
    }

    /// Advances the time step at the end of a sample period.
    pub fn advance(&mut self) {
        self.t += 1;
    }
}

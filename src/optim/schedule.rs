use serde::{Serialize, Deserialize};

/// Geometric learning-rate decay:
/// `lr(step) = initial_learning_rate · decay_rate^(step / decay_steps)`.
///
/// With `staircase` the exponent is floored, so the rate drops by
/// `decay_rate` once every `decay_steps` steps instead of continuously.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExponentialDecay {
    pub initial_learning_rate: f64,
    pub decay_steps: u64,
    pub decay_rate: f64,
    pub staircase: bool,
}

impl Default for ExponentialDecay {
    fn default() -> Self {
        ExponentialDecay {
            initial_learning_rate: 100.0,
            decay_steps: 100,
            decay_rate: 0.96,
            staircase: false,
        }
    }
}

impl ExponentialDecay {
    pub fn learning_rate(&self, step: u64) -> f64 {
        let mut exponent = step as f64 / self.decay_steps.max(1) as f64;
        if self.staircase {
            exponent = exponent.floor();
        }
        self.initial_learning_rate * self.decay_rate.powf(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn continuous_decay_matches_closed_form() {
        let s = ExponentialDecay::default();
        assert_relative_eq!(s.learning_rate(0), 100.0);
        assert_relative_eq!(s.learning_rate(100), 96.0);
        assert_relative_eq!(s.learning_rate(50), 100.0 * 0.96f64.sqrt());
        assert_relative_eq!(s.learning_rate(4000), 100.0 * 0.96f64.powi(40), max_relative = 1e-12);
    }

    #[test]
    fn staircase_holds_rate_between_boundaries() {
        let s = ExponentialDecay { staircase: true, ..ExponentialDecay::default() };
        assert_eq!(s.learning_rate(99), 100.0);
        assert_relative_eq!(s.learning_rate(100), 96.0);
        assert_relative_eq!(s.learning_rate(199), 96.0);
    }

    #[test]
    fn rate_never_increases() {
        let s = ExponentialDecay::default();
        let rates: Vec<f64> = (0..1000).step_by(7).map(|i| s.learning_rate(i)).collect();
        assert!(rates.windows(2).all(|w| w[1] <= w[0]));
    }
}

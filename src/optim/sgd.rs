use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor3;
use crate::optim::schedule::ExponentialDecay;

/// Plain stochastic gradient descent on a single tensor, with a decaying
/// learning rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sgd {
    pub schedule: ExponentialDecay,
    /// Number of updates applied so far.
    pub iterations: u64,
}

impl Sgd {
    pub fn new(schedule: ExponentialDecay) -> Sgd {
        Sgd { schedule, iterations: 0 }
    }

    /// Learning rate the next `step` will use.
    pub fn current_learning_rate(&self) -> f64 {
        self.schedule.learning_rate(self.iterations)
    }

    /// Applies `param -= lr · grad` and advances the schedule. Returns the rate used.
    pub fn step(&mut self, param: &mut Tensor3, grad: &Tensor3) -> f64 {
        let lr = self.current_learning_rate();
        param.add_scaled(grad, -lr);
        self.iterations += 1;
        lr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_against_gradient_and_decays() {
        let schedule = ExponentialDecay { initial_learning_rate: 1.0, decay_steps: 1, decay_rate: 0.5, staircase: true };
        let mut sgd = Sgd::new(schedule);
        let mut x = Tensor3::from_vec(1, 1, 2, vec![1.0, 1.0]).unwrap();
        let g = Tensor3::from_vec(1, 1, 2, vec![1.0, -2.0]).unwrap();

        assert_eq!(sgd.step(&mut x, &g), 1.0);
        assert_eq!(x.data, vec![0.0, 3.0]);
        assert_eq!(sgd.step(&mut x, &g), 0.5);
        assert_eq!(x.data, vec![-0.5, 4.0]);
        assert_eq!(sgd.iterations, 2);
    }
}

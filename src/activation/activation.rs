use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor3;

/// Element-wise activation applied after a convolution.
///
/// VGG-style feature extractors use `ReLU` throughout; the other variants
/// exist for custom architectures loaded from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    Identity,
    LeakyReLU { alpha: f64 },
}

impl Default for ActivationFunction {
    fn default() -> Self {
        ActivationFunction::ReLU
    }
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
        }
    }

    /// Derivative evaluated at the pre-activation value `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
        }
    }

    pub fn apply(&self, z: &Tensor3) -> Tensor3 {
        z.map(|x| self.function(x))
    }

    /// Chains `grad` (∂L/∂a) through the activation: returns ∂L/∂z = grad ⊙ σ'(z).
    pub fn backward(&self, pre_activation: &Tensor3, grad: &Tensor3) -> Tensor3 {
        assert_eq!(pre_activation.shape(), grad.shape());
        let mut out = grad.clone();
        for (g, &z) in out.data.iter_mut().zip(pre_activation.data.iter()) {
            *g *= self.derivative(z);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_masks_negative_pre_activations() {
        let z = Tensor3::from_vec(1, 1, 3, vec![-1.0, 0.0, 2.0]).unwrap();
        let g = Tensor3::from_vec(1, 1, 3, vec![5.0, 5.0, 5.0]).unwrap();
        let relu = ActivationFunction::ReLU;
        assert_eq!(relu.apply(&z).data, vec![0.0, 0.0, 2.0]);
        assert_eq!(relu.backward(&z, &g).data, vec![0.0, 0.0, 5.0]);
    }

    #[test]
    fn leaky_relu_keeps_a_slope() {
        let leaky = ActivationFunction::LeakyReLU { alpha: 0.1 };
        assert_eq!(leaky.function(-2.0), -0.2);
        assert_eq!(leaky.derivative(-2.0), 0.1);
    }
}

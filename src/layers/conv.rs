use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, StyleError};
use crate::math::tensor::Tensor3;

/// Side length of every convolution kernel.
pub const KERNEL: usize = 3;

/// 3×3 convolution, stride 1, zero "same" padding, followed by an activation.
///
/// Weights are laid out `[out][in][ky][kx]`. The layer is a frozen feature
/// extractor: `backward` only produces the gradient with respect to its input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
    /// Pre-activation output of the last forward pass, needed for σ'(z).
    #[serde(skip)]
    pre_activation: Option<Tensor3>,
}

impl Conv2d {
    /// He initialization: weights from N(0, sqrt(2 / fan_in)), zero biases.
    pub fn he<R: Rng>(in_channels: usize, out_channels: usize, activator: ActivationFunction, rng: &mut R) -> Conv2d {
        let fan_in = (in_channels * KERNEL * KERNEL) as f64;
        let std_dev = (2.0 / fan_in).sqrt();
        let weights = (0..out_channels * in_channels * KERNEL * KERNEL)
            .map(|_| sample_standard_normal(rng) * std_dev)
            .collect();
        Conv2d {
            in_channels,
            out_channels,
            weights,
            biases: vec![0.0; out_channels],
            activator,
            pre_activation: None,
        }
    }

    /// Builds a layer from explicit parameters, checking their lengths.
    pub fn from_parts(
        in_channels: usize,
        out_channels: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
        activator: ActivationFunction,
    ) -> Result<Conv2d> {
        let conv = Conv2d { in_channels, out_channels, weights, biases, activator, pre_activation: None };
        conv.validate()?;
        Ok(conv)
    }

    /// Checks that the parameter vectors agree with the declared channel counts.
    pub fn validate(&self) -> Result<()> {
        let expected = self.out_channels * self.in_channels * KERNEL * KERNEL;
        if self.weights.len() != expected {
            return Err(StyleError::ShapeMismatch {
                context: "Conv2d weights",
                expected: format!("{} values", expected),
                actual: format!("{} values", self.weights.len()),
            });
        }
        if self.biases.len() != self.out_channels {
            return Err(StyleError::ShapeMismatch {
                context: "Conv2d biases",
                expected: format!("{} values", self.out_channels),
                actual: format!("{} values", self.biases.len()),
            });
        }
        Ok(())
    }

    #[inline]
    fn weight(&self, o: usize, i: usize, ky: usize, kx: usize) -> f64 {
        self.weights[((o * self.in_channels + i) * KERNEL + ky) * KERNEL + kx]
    }

    /// Forward pass; caches the pre-activation for `backward`.
    pub fn forward(&mut self, input: &Tensor3) -> Result<Tensor3> {
        if input.channels != self.in_channels {
            return Err(StyleError::ShapeMismatch {
                context: "Conv2d input",
                expected: format!("{} channels", self.in_channels),
                actual: format!("{} channels", input.channels),
            });
        }
        let (h, w) = (input.height, input.width);
        let mut z = Tensor3::zeros(self.out_channels, h, w);

        for o in 0..self.out_channels {
            for y in 0..h {
                for x in 0..w {
                    let mut sum = self.biases[o];
                    for i in 0..self.in_channels {
                        for ky in 0..KERNEL {
                            let Some(iy) = offset(y, ky, h) else { continue };
                            for kx in 0..KERNEL {
                                let Some(ix) = offset(x, kx, w) else { continue };
                                sum += self.weight(o, i, ky, kx) * input.get(i, iy, ix);
                            }
                        }
                    }
                    z.set(o, y, x, sum);
                }
            }
        }

        let a = self.activator.apply(&z);
        self.pre_activation = Some(z);
        Ok(a)
    }

    /// Given ∂L/∂a for this layer's output, returns ∂L/∂input.
    pub fn backward(&self, grad_out: &Tensor3) -> Result<Tensor3> {
        let z = self.pre_activation.as_ref().ok_or(StyleError::NoForwardPass("Conv2d"))?;
        if z.shape() != grad_out.shape() {
            return Err(StyleError::ShapeMismatch {
                context: "Conv2d gradient",
                expected: format!("{:?}", z.shape()),
                actual: format!("{:?}", grad_out.shape()),
            });
        }
        let delta = self.activator.backward(z, grad_out);
        let (h, w) = (z.height, z.width);
        let mut grad_in = Tensor3::zeros(self.in_channels, h, w);

        for o in 0..self.out_channels {
            for y in 0..h {
                for x in 0..w {
                    let d = delta.get(o, y, x);
                    if d == 0.0 {
                        continue;
                    }
                    for i in 0..self.in_channels {
                        for ky in 0..KERNEL {
                            let Some(iy) = offset(y, ky, h) else { continue };
                            for kx in 0..KERNEL {
                                let Some(ix) = offset(x, kx, w) else { continue };
                                let idx = grad_in.index(i, iy, ix);
                                grad_in.data[idx] += self.weight(o, i, ky, kx) * d;
                            }
                        }
                    }
                }
            }
        }

        Ok(grad_in)
    }
}

/// Input coordinate touched by kernel tap `k` at output coordinate `pos`,
/// or `None` when it falls in the zero padding.
#[inline]
fn offset(pos: usize, k: usize, len: usize) -> Option<usize> {
    let p = (pos + k).checked_sub(KERNEL / 2)?;
    if p < len { Some(p) } else { None }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // (0, 1] keeps ln() finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

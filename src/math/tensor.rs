use serde::{Serialize, Deserialize};

use crate::error::{Result, StyleError};
use crate::math::matrix::Matrix;

/// Shape of a channel-major 3-D tensor: `(channels, height, width)`.
pub type Shape = (usize, usize, usize);

/// Channel-major `[channels][height][width]` tensor of `f64`.
///
/// Images and layer activations share this type. Element `(c, y, x)` lives at
/// `data[(c * height + y) * width + x]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor3 {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f64>,
}

impl Tensor3 {
    pub fn zeros(channels: usize, height: usize, width: usize) -> Tensor3 {
        Tensor3 {
            channels,
            height,
            width,
            data: vec![0.0; channels * height * width],
        }
    }

    /// Wraps `data` as a tensor, failing when its length does not match the shape.
    pub fn from_vec(channels: usize, height: usize, width: usize, data: Vec<f64>) -> Result<Tensor3> {
        let expected = channels * height * width;
        if data.len() != expected {
            return Err(StyleError::ShapeMismatch {
                context: "Tensor3::from_vec",
                expected: format!("{} elements ({}x{}x{})", expected, channels, height, width),
                actual: format!("{} elements", data.len()),
            });
        }
        Ok(Tensor3 { channels, height, width, data })
    }

    pub fn shape(&self) -> Shape {
        (self.channels, self.height, self.width)
    }

    /// Number of pixels per channel (`height * width`).
    pub fn spatial_size(&self) -> usize {
        self.height * self.width
    }

    #[inline]
    pub fn index(&self, c: usize, y: usize, x: usize) -> usize {
        (c * self.height + y) * self.width + x
    }

    #[inline]
    pub fn get(&self, c: usize, y: usize, x: usize) -> f64 {
        self.data[self.index(c, y, x)]
    }

    #[inline]
    pub fn set(&mut self, c: usize, y: usize, x: usize, value: f64) {
        let i = self.index(c, y, x);
        self.data[i] = value;
    }

    /// Contiguous slice holding one channel's feature map.
    pub fn channel(&self, c: usize) -> &[f64] {
        let n = self.spatial_size();
        &self.data[c * n..(c + 1) * n]
    }

    /// Flattens every channel into one row: a `C × (H·W)` matrix.
    pub fn flatten_channels(&self) -> Matrix {
        Matrix::from_data((0..self.channels).map(|c| self.channel(c).to_vec()).collect())
    }

    pub fn map<F>(&self, functor: F) -> Tensor3
    where
        F: Fn(f64) -> f64,
    {
        Tensor3 {
            channels: self.channels,
            height: self.height,
            width: self.width,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Element-wise `self - rhs`. Panics on shape mismatch, like `Matrix`'s operators.
    pub fn sub(&self, rhs: &Tensor3) -> Tensor3 {
        assert_eq!(self.shape(), rhs.shape(), "Tensors are of incorrect sizes");
        Tensor3 {
            channels: self.channels,
            height: self.height,
            width: self.width,
            data: self.data.iter().zip(rhs.data.iter()).map(|(a, b)| a - b).collect(),
        }
    }

    /// `self += rhs`, element-wise.
    pub fn add_assign(&mut self, rhs: &Tensor3) {
        assert_eq!(self.shape(), rhs.shape(), "Tensors are of incorrect sizes");
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a += b;
        }
    }

    /// `self += factor * rhs`, element-wise.
    pub fn add_scaled(&mut self, rhs: &Tensor3, factor: f64) {
        assert_eq!(self.shape(), rhs.shape(), "Tensors are of incorrect sizes");
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a += factor * b;
        }
    }

    pub fn scale(&self, factor: f64) -> Tensor3 {
        self.map(|x| x * factor)
    }

    pub fn sum_squares(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }
}

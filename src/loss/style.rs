use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor3;

/// Gram matrix of a layer's activations: `F Fᵀ` where `F` is the `C × (H·W)`
/// matrix of flattened feature maps. Entry `(i, j)` is the correlation of
/// channels `i` and `j` summed over every spatial position.
pub fn gram_matrix(features: &Tensor3) -> Matrix {
    features.flatten_channels().outer_self()
}

/// Gram-matrix penalty capturing texture statistics independent of layout.
pub struct StyleLoss;

impl StyleLoss {
    /// `4 · C² · (H·W)²` for a layer with `C` channels and `H·W` pixels.
    fn normalizer(features: &Tensor3) -> f64 {
        let c = features.channels as f64;
        let n = features.spatial_size() as f64;
        4.0 * c * c * n * n
    }

    /// Σ (S - G)² / (4 · C² · (H·W)²), with `S` the style Gram and `G` the
    /// generated Gram. Pass the precomputed style Gram to avoid rebuilding it.
    pub fn loss(style_gram: &Matrix, generated: &Tensor3) -> f64 {
        let g = gram_matrix(generated);
        (style_gram.clone() - g).sum_squares() / Self::normalizer(generated)
    }

    /// ∂L/∂F = 4 (G - S) F / (4 · C² · (H·W)²), reshaped back to the layer shape.
    pub fn derivative(style_gram: &Matrix, generated: &Tensor3) -> Tensor3 {
        let f = generated.flatten_channels();
        let g = f.outer_self();
        let diff = g - style_gram.clone();
        let scale = 4.0 / Self::normalizer(generated);
        let grad = (diff * f).map(|x| x * scale);
        Tensor3 {
            channels: generated.channels,
            height: generated.height,
            width: generated.width,
            data: grad.data.into_iter().flatten().collect(),
        }
    }
}

use crate::math::tensor::Tensor3;

/// Squared-error penalty between the same layer's activations for the
/// content image and the generated image.
pub struct ContentLoss;

impl ContentLoss {
    /// Σ (generated - content)². Not normalized; the content weight absorbs scale.
    pub fn loss(content: &Tensor3, generated: &Tensor3) -> f64 {
        assert_eq!(content.shape(), generated.shape(), "content activations differ in shape");
        content.data.iter().zip(generated.data.iter())
            .map(|(c, g)| (g - c).powi(2))
            .sum()
    }

    /// ∂L/∂generated = 2 (generated - content)
    pub fn derivative(content: &Tensor3, generated: &Tensor3) -> Tensor3 {
        generated.sub(content).scale(2.0)
    }
}

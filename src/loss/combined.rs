use serde::{Serialize, Deserialize};

use crate::error::{Result, StyleError};
use crate::loss::content::ContentLoss;
use crate::loss::style::{gram_matrix, StyleLoss};
use crate::loss::total_variation::TotalVariationLoss;
use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor3;
use crate::network::network::Activations;

/// The three user-tunable loss weights. Nothing normalizes their relative
/// scale; good values are found empirically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossWeights {
    pub content: f64,
    pub style: f64,
    pub total_variation: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        LossWeights { content: 2.5e-8, style: 1e-6, total_variation: 1e-6 }
    }
}

/// Weighted loss terms of one evaluation. `total` is their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub content: f64,
    pub style: f64,
    pub total_variation: f64,
    pub total: f64,
}

/// Fixed targets derived from the content and style images.
#[derive(Debug, Clone)]
pub struct StyleTargets {
    pub content_layer: String,
    pub content_features: Tensor3,
    /// `(layer name, style Gram matrix)` in configuration order.
    pub style_grams: Vec<(String, Matrix)>,
}

impl StyleTargets {
    /// Extracts the targets from the content image's and style image's activations.
    pub fn new(
        content_layer: &str,
        style_layers: &[String],
        content_acts: &Activations,
        style_acts: &Activations,
    ) -> Result<StyleTargets> {
        if style_layers.is_empty() {
            return Err(StyleError::EmptyLayerSet);
        }
        let content_features = content_acts.get(content_layer)
            .ok_or_else(|| StyleError::UnknownLayer(content_layer.to_owned()))?
            .clone();
        let style_grams = style_layers.iter()
            .map(|name| {
                style_acts.get(name)
                    .map(|f| (name.clone(), gram_matrix(f)))
                    .ok_or_else(|| StyleError::UnknownLayer(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(StyleTargets { content_layer: content_layer.to_owned(), content_features, style_grams })
    }

    /// Every layer the generated image must be evaluated at.
    pub fn layer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.style_grams.iter().map(|(n, _)| n.clone()).collect();
        if !names.contains(&self.content_layer) {
            names.push(self.content_layer.clone());
        }
        names
    }
}

/// Result of evaluating the combined loss for the generated image.
pub struct Evaluation {
    pub breakdown: LossBreakdown,
    /// ∂L/∂(layer output) for every layer the loss reads.
    pub feature_grads: Activations,
    /// ∂L/∂pixels from the total-variation term only; the feature terms still
    /// need to be back-propagated through the network.
    pub pixel_grad: Tensor3,
}

/// Evaluates `w_c · content + Σ (w_s / L) · style_l + w_tv · tv` and its
/// gradients with respect to each contributing tensor.
pub fn evaluate(
    targets: &StyleTargets,
    weights: &LossWeights,
    generated_acts: &Activations,
    generated: &Tensor3,
) -> Result<Evaluation> {
    let mut feature_grads = Activations::new();

    let gen_content = generated_acts.get(&targets.content_layer)
        .ok_or_else(|| StyleError::UnknownLayer(targets.content_layer.clone()))?;
    if gen_content.shape() != targets.content_features.shape() {
        return Err(StyleError::ShapeMismatch {
            context: "content activations",
            expected: format!("{:?}", targets.content_features.shape()),
            actual: format!("{:?}", gen_content.shape()),
        });
    }
    let content = weights.content * ContentLoss::loss(&targets.content_features, gen_content);
    feature_grads.insert(
        targets.content_layer.clone(),
        ContentLoss::derivative(&targets.content_features, gen_content).scale(weights.content),
    );

    let per_layer = weights.style / targets.style_grams.len() as f64;
    let mut style = 0.0;
    for (name, style_gram) in &targets.style_grams {
        let gen = generated_acts.get(name)
            .ok_or_else(|| StyleError::UnknownLayer(name.clone()))?;
        if style_gram.rows != gen.channels {
            return Err(StyleError::ShapeMismatch {
                context: "style Gram matrix",
                expected: format!("{} channels", style_gram.rows),
                actual: format!("{} channels", gen.channels),
            });
        }
        style += per_layer * StyleLoss::loss(style_gram, gen);
        let grad = StyleLoss::derivative(style_gram, gen).scale(per_layer);
        match feature_grads.get_mut(name) {
            Some(existing) => existing.add_assign(&grad),
            None => {
                feature_grads.insert(name.clone(), grad);
            }
        }
    }

    let total_variation = weights.total_variation * TotalVariationLoss::loss(generated);
    let pixel_grad = TotalVariationLoss::derivative(generated).scale(weights.total_variation);

    Ok(Evaluation {
        breakdown: LossBreakdown {
            content,
            style,
            total_variation,
            total: content + style + total_variation,
        },
        feature_grads,
        pixel_grad,
    })
}

use std::collections::BTreeMap;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::error::{Result, StyleError};
use crate::layers::conv::Conv2d;
use crate::layers::layer::{Layer, LayerOp};
use crate::layers::pool::Pool2d;
use crate::math::tensor::Tensor3;
use crate::network::spec::{LayerSpec, NetworkSpec};

/// Layer name → that layer's output tensor.
pub type Activations = BTreeMap<String, Tensor3>;

/// A sequential convolutional feature extractor with frozen weights.
///
/// `forward` caches per-layer state, so a `backward` call differentiates the
/// most recent forward pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub input_channels: usize,
    pub layers: Vec<Layer>,
    /// Index of the deepest layer reached by the last forward pass.
    #[serde(skip)]
    forward_depth: Option<usize>,
}

impl Network {
    /// Builds a network from `spec` with He-initialized weights drawn from `seed`.
    pub fn from_spec(spec: &NetworkSpec, seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut channels = spec.input_channels;
        let layers = spec.layers.iter()
            .map(|layer_spec| match layer_spec {
                LayerSpec::Conv { name, out_channels, activation } => {
                    let conv = Conv2d::he(channels, *out_channels, *activation, &mut rng);
                    channels = *out_channels;
                    Layer { name: name.clone(), op: LayerOp::Conv(conv) }
                }
                LayerSpec::Pool { name, kind } => {
                    Layer { name: name.clone(), op: LayerOp::Pool(Pool2d::new(*kind)) }
                }
            })
            .collect();
        Network {
            name: spec.name.clone(),
            input_channels: spec.input_channels,
            layers,
            forward_depth: None,
        }
    }

    /// Position of the layer called `name`.
    pub fn layer_index(&self, name: &str) -> Result<usize> {
        self.layers.iter()
            .position(|l| l.name == name)
            .ok_or_else(|| StyleError::UnknownLayer(name.to_owned()))
    }

    /// Checks that consecutive convolutions agree on their channel counts.
    pub fn validate(&self) -> Result<()> {
        let mut channels = self.input_channels;
        for layer in &self.layers {
            if let LayerOp::Conv(conv) = &layer.op {
                conv.validate()?;
                if conv.in_channels != channels {
                    return Err(StyleError::ShapeMismatch {
                        context: "Network layer chain",
                        expected: format!("{} input channels at `{}`", channels, layer.name),
                        actual: format!("{}", conv.in_channels),
                    });
                }
                channels = conv.out_channels;
            }
        }
        Ok(())
    }

    /// Runs the input through the network, stopping at the deepest layer named
    /// in `wanted`, and returns the outputs of exactly those layers.
    pub fn forward(&mut self, input: &Tensor3, wanted: &[String]) -> Result<Activations> {
        let mut deepest = None;
        for name in wanted {
            let idx = self.layer_index(name)?;
            deepest = Some(deepest.map_or(idx, |d: usize| d.max(idx)));
        }
        let Some(deepest) = deepest else {
            return Ok(Activations::new());
        };

        let mut activations = Activations::new();
        let mut current = input.clone();
        self.forward_depth = None;
        for layer in &mut self.layers[..=deepest] {
            current = layer.forward(&current)?;
            if wanted.iter().any(|w| *w == layer.name) {
                activations.insert(layer.name.clone(), current.clone());
            }
        }
        self.forward_depth = Some(deepest);
        Ok(activations)
    }

    /// Back-propagates per-layer output gradients to the network input.
    ///
    /// Each entry of `grads` is ∂L/∂(output of that layer); contributions from
    /// several layers are summed as they meet on the way down.
    pub fn backward(&self, grads: &Activations, input_shape: (usize, usize, usize)) -> Result<Tensor3> {
        let mut deepest = None;
        for name in grads.keys() {
            let idx = self.layer_index(name)?;
            deepest = Some(deepest.map_or(idx, |d: usize| d.max(idx)));
        }
        let Some(deepest) = deepest else {
            let (c, h, w) = input_shape;
            return Ok(Tensor3::zeros(c, h, w));
        };
        match self.forward_depth {
            Some(depth) if depth >= deepest => {}
            _ => return Err(StyleError::NoForwardPass("Network")),
        }

        let mut delta: Option<Tensor3> = None;
        for layer in self.layers[..=deepest].iter().rev() {
            if let Some(g) = grads.get(&layer.name) {
                match delta.as_mut() {
                    Some(d) => d.add_assign(g),
                    None => delta = Some(g.clone()),
                }
            }
            if let Some(d) = delta.take() {
                delta = Some(layer.backward(&d)?);
            }
        }

        let (c, h, w) = input_shape;
        Ok(delta.unwrap_or_else(|| Tensor3::zeros(c, h, w)))
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network previously written by `save_json` (or exported
    /// from pretrained weights in the same layout) and validates it.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let network: Network = serde_json::from_reader(reader)?;
        network.validate()?;
        Ok(network)
    }
}

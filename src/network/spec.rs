use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::layers::pool::PoolKind;

/// Describes one layer in a network specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    /// 3×3 same-padded convolution; input channels follow from the previous layer.
    Conv {
        name: String,
        out_channels: usize,
        #[serde(default)]
        activation: ActivationFunction,
    },
    /// 2×2 stride-2 pooling.
    Pool {
        name: String,
        kind: PoolKind,
    },
}

impl LayerSpec {
    pub fn name(&self) -> &str {
        match self {
            LayerSpec::Conv { name, .. } | LayerSpec::Pool { name, .. } => name,
        }
    }
}

/// A serializable description of a convolutional feature extractor.
///
/// `NetworkSpec` can be saved and loaded independently of any weights, so an
/// architecture can be stored before it is initialized or trained elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, e.g. `vgg19`.
    pub name: String,
    /// Channels of the input image (3 for BGR).
    pub input_channels: usize,
    /// Ordered list of layers (input → output).
    pub layers: Vec<LayerSpec>,
}

/// Conv counts and widths of the five VGG19 blocks.
const VGG19_BLOCKS: [(usize, usize); 5] = [(2, 64), (2, 128), (4, 256), (4, 512), (4, 512)];

impl NetworkSpec {
    /// The VGG19 convolutional base (no classifier head), with its layer names.
    pub fn vgg19() -> NetworkSpec {
        NetworkSpec::vgg19_scaled(1)
    }

    /// VGG19 layer names and depth with every channel count divided by
    /// `divisor` (minimum 1 channel). Useful for random-feature runs on a CPU.
    pub fn vgg19_scaled(divisor: usize) -> NetworkSpec {
        let divisor = divisor.max(1);
        let mut layers = Vec::new();
        for (b, &(convs, width)) in VGG19_BLOCKS.iter().enumerate() {
            let block = b + 1;
            for c in 1..=convs {
                layers.push(LayerSpec::Conv {
                    name: format!("block{}_conv{}", block, c),
                    out_channels: (width / divisor).max(1),
                    activation: ActivationFunction::ReLU,
                });
            }
            layers.push(LayerSpec::Pool {
                name: format!("block{}_pool", block),
                kind: PoolKind::Max,
            });
        }
        NetworkSpec {
            name: if divisor == 1 { "vgg19".to_owned() } else { format!("vgg19_div{}", divisor) },
            input_channels: 3,
            layers,
        }
    }

    /// Replaces every pooling layer's kind, e.g. average pooling as suggested
    /// for style transfer by Gatys et al.
    pub fn with_pooling(mut self, kind: PoolKind) -> NetworkSpec {
        for layer in &mut self.layers {
            if let LayerSpec::Pool { kind: k, .. } = layer {
                *k = kind;
            }
        }
        self
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

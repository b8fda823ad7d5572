use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::layers::conv::Conv2d;
use crate::layers::pool::Pool2d;
use crate::math::tensor::Tensor3;

/// One operation of the feature extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerOp {
    Conv(Conv2d),
    Pool(Pool2d),
}

/// A layer addressable by name (e.g. `block4_conv1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub op: LayerOp,
}

impl Layer {
    pub fn forward(&mut self, input: &Tensor3) -> Result<Tensor3> {
        match &mut self.op {
            LayerOp::Conv(conv) => conv.forward(input),
            LayerOp::Pool(pool) => pool.forward(input),
        }
    }

    pub fn backward(&self, grad_out: &Tensor3) -> Result<Tensor3> {
        match &self.op {
            LayerOp::Conv(conv) => conv.backward(grad_out),
            LayerOp::Pool(pool) => pool.backward(grad_out),
        }
    }
}

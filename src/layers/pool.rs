use serde::{Serialize, Deserialize};

use crate::error::{Result, StyleError};
use crate::math::tensor::{Shape, Tensor3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Max,
    Average,
}

/// 2×2 pooling with stride 2. Odd trailing rows/columns are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool2d {
    pub kind: PoolKind,
    #[serde(skip)]
    input_shape: Option<Shape>,
    /// For max pooling: flat input index that won each output cell.
    #[serde(skip)]
    winners: Vec<usize>,
}

impl Pool2d {
    pub fn new(kind: PoolKind) -> Pool2d {
        Pool2d { kind, input_shape: None, winners: Vec::new() }
    }

    pub fn forward(&mut self, input: &Tensor3) -> Result<Tensor3> {
        let (c, h, w) = input.shape();
        let (oh, ow) = (h / 2, w / 2);
        if oh == 0 || ow == 0 {
            return Err(StyleError::ShapeMismatch {
                context: "Pool2d input",
                expected: "at least 2x2 pixels".to_owned(),
                actual: format!("{}x{}", h, w),
            });
        }
        let mut out = Tensor3::zeros(c, oh, ow);
        self.winners.clear();

        for ch in 0..c {
            for y in 0..oh {
                for x in 0..ow {
                    let taps = [
                        input.index(ch, 2 * y, 2 * x),
                        input.index(ch, 2 * y, 2 * x + 1),
                        input.index(ch, 2 * y + 1, 2 * x),
                        input.index(ch, 2 * y + 1, 2 * x + 1),
                    ];
                    let value = match self.kind {
                        PoolKind::Max => {
                            let mut best = taps[0];
                            for &t in &taps[1..] {
                                if input.data[t] > input.data[best] {
                                    best = t;
                                }
                            }
                            self.winners.push(best);
                            input.data[best]
                        }
                        PoolKind::Average => taps.iter().map(|&t| input.data[t]).sum::<f64>() / 4.0,
                    };
                    out.set(ch, y, x, value);
                }
            }
        }

        self.input_shape = Some(input.shape());
        Ok(out)
    }

    /// Routes ∂L/∂out back to the input cells that produced each output.
    pub fn backward(&self, grad_out: &Tensor3) -> Result<Tensor3> {
        let (c, h, w) = self.input_shape.ok_or(StyleError::NoForwardPass("Pool2d"))?;
        if grad_out.shape() != (c, h / 2, w / 2) {
            return Err(StyleError::ShapeMismatch {
                context: "Pool2d gradient",
                expected: format!("{:?}", (c, h / 2, w / 2)),
                actual: format!("{:?}", grad_out.shape()),
            });
        }
        let mut grad_in = Tensor3::zeros(c, h, w);

        match self.kind {
            PoolKind::Max => {
                for (&winner, &g) in self.winners.iter().zip(grad_out.data.iter()) {
                    grad_in.data[winner] += g;
                }
            }
            PoolKind::Average => {
                for ch in 0..c {
                    for y in 0..h / 2 {
                        for x in 0..w / 2 {
                            let share = grad_out.get(ch, y, x) / 4.0;
                            for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                                grad_in.set(ch, 2 * y + dy, 2 * x + dx, share);
                            }
                        }
                    }
                }
            }
        }

        Ok(grad_in)
    }
}

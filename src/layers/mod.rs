pub mod conv;
pub mod pool;
pub mod layer;

pub use conv::Conv2d;
pub use pool::{Pool2d, PoolKind};
pub use layer::{Layer, LayerOp};

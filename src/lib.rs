pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod imaging;
pub mod transfer;

// Convenience re-exports
pub use error::{Result, StyleError};
pub use math::matrix::Matrix;
pub use math::tensor::Tensor3;
pub use activation::activation::ActivationFunction;
pub use layers::pool::PoolKind;
pub use network::network::{Activations, Network};
pub use network::spec::NetworkSpec;
pub use loss::combined::{LossBreakdown, LossWeights};
pub use optim::schedule::ExponentialDecay;
pub use optim::sgd::Sgd;
pub use transfer::{run_style_transfer, IterationStats, StyleTransfer, TransferConfig, TransferOutcome};

pub mod network;
pub mod spec;

pub use network::{Activations, Network};
pub use spec::{LayerSpec, NetworkSpec};

pub mod schedule;
pub mod sgd;

pub use schedule::ExponentialDecay;
pub use sgd::Sgd;

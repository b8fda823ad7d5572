pub mod transfer_config;
pub mod iteration_stats;
pub mod snapshot;
pub mod loop_fn;
pub mod runner;

pub use transfer_config::TransferConfig;
pub use iteration_stats::IterationStats;
pub use snapshot::snapshot_path;
pub use loop_fn::{StyleTransfer, TransferOutcome};
pub use runner::run_style_transfer;

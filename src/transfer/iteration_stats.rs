use std::path::PathBuf;

use serde::{Serialize, Deserialize};

/// Per-iteration statistics emitted by the transfer loop.
///
/// When a `progress_tx` channel is configured in `TransferConfig`, the loop
/// sends one `IterationStats` value after every completed iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationStats {
    /// 1-based iteration number.
    pub iteration: usize,
    pub total_iterations: usize,
    /// Weighted total loss, evaluated before this iteration's update.
    pub loss: f64,
    pub content_loss: f64,
    pub style_loss: f64,
    pub tv_loss: f64,
    /// Learning rate used for this iteration's update.
    pub learning_rate: f64,
    /// Wall-clock duration of this iteration in milliseconds.
    pub elapsed_ms: u64,
    /// Snapshot written at this iteration, if any.
    pub snapshot: Option<PathBuf>,
}

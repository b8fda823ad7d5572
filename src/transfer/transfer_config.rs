use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use serde::{Serialize, Deserialize};

use crate::error::{Result, StyleError};
use crate::loss::combined::LossWeights;
use crate::optim::schedule::ExponentialDecay;
use crate::transfer::iteration_stats::IterationStats;

/// Configuration for a style-transfer run.
///
/// Everything except the two runtime hooks is persisted as JSON; missing
/// fields fall back to [`TransferConfig::default`].
///
/// # Runtime hooks
/// - `progress_tx` - optional channel sender; one `IterationStats` is sent per
///                   iteration. If the receiver is dropped the loop ends.
/// - `stop_flag`   - optional atomic flag; when set from another thread the
///                   loop ends after the current iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Layer whose activations carry the content.
    pub content_layer: String,
    /// Layers whose Gram matrices carry the style, shallow to deep.
    pub style_layers: Vec<String>,
    pub weights: LossWeights,
    /// Fixed iteration budget; there is no convergence check.
    pub iterations: usize,
    pub schedule: ExponentialDecay,
    /// Write a snapshot every `save_every` iterations; 0 disables snapshots.
    pub save_every: usize,
    pub output_dir: PathBuf,
    /// Snapshots are named `{prefix}_at_iteration_{i}.png`.
    pub prefix: String,
    /// Both images are resized to this many rows.
    pub image_height: u32,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<IterationStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            content_layer: "block5_conv2".to_owned(),
            style_layers: (1..=5).map(|b| format!("block{}_conv1", b)).collect(),
            weights: LossWeights::default(),
            iterations: 4000,
            schedule: ExponentialDecay::default(),
            save_every: 100,
            output_dir: PathBuf::from("."),
            prefix: "generated".to_owned(),
            image_height: 400,
            progress_tx: None,
            stop_flag: None,
        }
    }
}

impl TransferConfig {
    /// Rejects configurations that cannot run at all. Layer names are checked
    /// later against the actual network.
    pub fn validate(&self) -> Result<()> {
        if self.style_layers.is_empty() {
            return Err(StyleError::EmptyLayerSet);
        }
        if self.image_height == 0 {
            return Err(StyleError::InvalidConfig("image_height must be at least 1".to_owned()));
        }
        if self.schedule.decay_steps == 0 {
            return Err(StyleError::InvalidConfig("schedule.decay_steps must be at least 1".to_owned()));
        }
        if self.prefix.is_empty() {
            return Err(StyleError::InvalidConfig("prefix must not be empty".to_owned()));
        }
        Ok(())
    }

    /// Serializes the persisted fields to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `TransferConfig` from a JSON file.
    pub fn load_json(path: &str) -> Result<TransferConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

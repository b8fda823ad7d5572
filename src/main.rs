use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ferrite_style::{run_style_transfer, Network, NetworkSpec, PoolKind, TransferConfig};

#[derive(Clone, Copy, ValueEnum)]
enum Pooling {
    Max,
    Average,
}

/// Paints the content of one image in the style of another by gradient
/// descent on the pixels.
#[derive(Parser)]
#[command(name = "ferrite-style", version, about)]
struct Cli {
    /// Image whose content is kept
    #[arg(long)]
    content: PathBuf,
    /// Image whose style is transferred
    #[arg(long)]
    style: PathBuf,
    /// Directory for the iteration snapshots
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// JSON run configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON network with pretrained weights. Without it a randomly
    /// initialized VGG19-shaped network is used.
    #[arg(long)]
    weights: Option<PathBuf>,
    #[arg(long)]
    iterations: Option<usize>,
    /// Snapshot interval in iterations (0 disables snapshots)
    #[arg(long)]
    save_every: Option<usize>,
    /// Working height in pixels; width follows the content image
    #[arg(long)]
    height: Option<u32>,
    /// Snapshot file prefix
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    content_weight: Option<f64>,
    #[arg(long)]
    style_weight: Option<f64>,
    #[arg(long)]
    tv_weight: Option<f64>,
    /// Initial learning rate of the decay schedule
    #[arg(long)]
    learning_rate: Option<f64>,
    /// Seed for random network weights
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Divide every VGG19 channel count by this for random networks
    #[arg(long, default_value_t = 1)]
    width_divisor: usize,
    /// Pooling for random networks
    #[arg(long, value_enum, default_value_t = Pooling::Max)]
    pooling: Pooling,
}

impl Cli {
    fn transfer_config(&self) -> Result<TransferConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_str().context("config path is not valid UTF-8")?;
                TransferConfig::load_json(path).with_context(|| format!("reading config {}", path))?
            }
            None => TransferConfig::default(),
        };
        if let Some(dir) = &self.output_dir { config.output_dir = dir.clone(); }
        if let Some(n) = self.iterations { config.iterations = n; }
        if let Some(n) = self.save_every { config.save_every = n; }
        if let Some(h) = self.height { config.image_height = h; }
        if let Some(p) = &self.prefix { config.prefix = p.clone(); }
        if let Some(w) = self.content_weight { config.weights.content = w; }
        if let Some(w) = self.style_weight { config.weights.style = w; }
        if let Some(w) = self.tv_weight { config.weights.total_variation = w; }
        if let Some(lr) = self.learning_rate { config.schedule.initial_learning_rate = lr; }
        Ok(config)
    }

    fn network(&self) -> Result<Network> {
        match &self.weights {
            Some(path) => {
                let path = path.to_str().context("weights path is not valid UTF-8")?;
                Network::load_json(path).with_context(|| format!("loading network {}", path))
            }
            None => {
                let kind = match self.pooling {
                    Pooling::Max => PoolKind::Max,
                    Pooling::Average => PoolKind::Average,
                };
                let spec = NetworkSpec::vgg19_scaled(self.width_divisor).with_pooling(kind);
                warn!(network = %spec.name, seed = self.seed, "no --weights given, using random features");
                Ok(Network::from_spec(&spec, self.seed))
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.transfer_config()?;
    let network = cli.network()?;

    let outcome = run_style_transfer(network, &cli.content, &cli.style, config)
        .context("style transfer failed")?;

    info!(
        iterations = outcome.iterations_completed,
        loss = outcome.final_loss.total,
        snapshots = outcome.snapshots.len(),
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let path = path.to_str().unwrap();
        let mut file_config = TransferConfig::default();
        file_config.iterations = 10;
        file_config.prefix = "from_file".to_owned();
        file_config.weights.style = 3.0;
        file_config.weights.total_variation = 2.0;
        file_config.save_json(path).unwrap();

        let cli = Cli::parse_from([
            "ferrite-style",
            "--content", "c.png",
            "--style", "s.png",
            "--config", path,
            "--iterations", "7",
            "--tv-weight", "0.5",
            "--learning-rate", "4",
        ]);
        let config = cli.transfer_config().unwrap();

        assert_eq!(config.iterations, 7);
        assert_eq!(config.weights.total_variation, 0.5);
        assert_eq!(config.schedule.initial_learning_rate, 4.0);
        assert_eq!(config.prefix, "from_file");
        assert_eq!(config.weights.style, 3.0);
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let cli = Cli::parse_from(["ferrite-style", "--content", "c.png", "--style", "s.png", "--height", "64"]);
        let config = cli.transfer_config().unwrap();
        assert_eq!(config.image_height, 64);
        assert_eq!(config.iterations, TransferConfig::default().iterations);
    }
}

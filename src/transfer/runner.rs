use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::imaging::io::load_image;
use crate::network::network::Network;
use crate::transfer::loop_fn::{StyleTransfer, TransferOutcome};
use crate::transfer::transfer_config::TransferConfig;

/// Loads both images from disk and runs the full optimization.
pub fn run_style_transfer<P, Q>(
    network: Network,
    content_path: P,
    style_path: Q,
    config: TransferConfig,
) -> Result<TransferOutcome>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let content_path = content_path.as_ref();
    let style_path = style_path.as_ref();
    info!(content = %content_path.display(), style = %style_path.display(), network = %network.name, "loading images");

    let content = load_image(content_path)?;
    let style = load_image(style_path)?;
    let mut transfer = StyleTransfer::from_images(network, &content, &style, config)?;
    transfer.run()
}

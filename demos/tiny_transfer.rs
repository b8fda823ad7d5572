use ferrite_style::{
    imaging::preprocess, ExponentialDecay, LossWeights, Network, NetworkSpec, PoolKind,
    StyleTransfer, TransferConfig,
};
use image::{Rgb, RgbImage};

fn main() -> ferrite_style::Result<()> {
    // Content: a soft diagonal gradient. Style: hard-edged stripes.
    let content = RgbImage::from_fn(48, 32, |x, y| Rgb([(x * 5) as u8, (y * 7) as u8, 128]));
    let style = RgbImage::from_fn(48, 32, |x, _| {
        if (x / 4) % 2 == 0 { Rgb([230, 40, 40]) } else { Rgb([20, 20, 90]) }
    });

    let spec = NetworkSpec::vgg19_scaled(16).with_pooling(PoolKind::Average);
    let network = Network::from_spec(&spec, 42);

    let config = TransferConfig {
        iterations: 200,
        save_every: 50,
        output_dir: "tiny_transfer_out".into(),
        prefix: "stripes".to_owned(),
        weights: LossWeights { content: 1e-4, style: 1.0, total_variation: 1e-6 },
        schedule: ExponentialDecay { initial_learning_rate: 1e-2, decay_steps: 50, decay_rate: 0.9, staircase: true },
        ..TransferConfig::default()
    };

    let mut transfer = StyleTransfer::new(network, &preprocess(&content), &preprocess(&style), config)?;
    println!("Initial loss: {:.6}", transfer.loss()?.total);

    let outcome = transfer.run()?;
    println!("Final loss:   {:.6}", outcome.final_loss.total);
    for path in &outcome.snapshots {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

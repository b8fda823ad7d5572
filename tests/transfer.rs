use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use ferrite_style::imaging::preprocess;
use ferrite_style::transfer::snapshot_path;
use ferrite_style::{
    run_style_transfer, ExponentialDecay, LossWeights, Network, NetworkSpec, PoolKind,
    StyleError, StyleTransfer, Tensor3, TransferConfig,
};
use image::{DynamicImage, Rgb, RgbImage};

fn tiny_network() -> Network {
    let spec = NetworkSpec::vgg19_scaled(32).with_pooling(PoolKind::Average);
    Network::from_spec(&spec, 5)
}

fn content_image() -> RgbImage {
    RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 15) as u8, (y * 15) as u8, 100]))
}

fn style_image() -> RgbImage {
    RgbImage::from_fn(16, 16, |x, y| {
        if (x / 2 + y / 2) % 2 == 0 { Rgb([250, 200, 10]) } else { Rgb([10, 30, 60]) }
    })
}

/// Small constant learning rate so every step is a descent step.
fn gentle_config(dir: &std::path::Path) -> TransferConfig {
    TransferConfig {
        iterations: 5,
        save_every: 2,
        output_dir: dir.to_path_buf(),
        prefix: "tiny".to_owned(),
        weights: LossWeights { content: 1e-3, style: 1.0, total_variation: 1e-6 },
        schedule: ExponentialDecay { initial_learning_rate: 1e-5, decay_steps: 1, decay_rate: 1.0, staircase: false },
        ..TransferConfig::default()
    }
}

#[test]
fn short_run_lowers_loss_and_writes_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, rx) = mpsc::channel();
    let config = TransferConfig { progress_tx: Some(tx), ..gentle_config(dir.path()) };

    let content = preprocess(&content_image());
    let mut transfer = StyleTransfer::new(tiny_network(), &content, &preprocess(&style_image()), config).unwrap();

    // The generated image starts as the content image.
    assert_eq!(transfer.generated(), &content);
    let initial = transfer.loss().unwrap();
    assert_eq!(initial.content, 0.0);
    assert!(initial.style > 0.0);

    let outcome = transfer.run().unwrap();
    assert_eq!(outcome.iterations_completed, 5);
    assert_eq!(transfer.iteration(), 5);
    assert!(transfer.loss().unwrap().total < initial.total);
    assert_ne!(transfer.generated(), &content);

    let expected = vec![
        snapshot_path(dir.path(), "tiny", 2),
        snapshot_path(dir.path(), "tiny", 4),
    ];
    assert_eq!(outcome.snapshots, expected);
    for path in &expected {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (16, 16));
    }
    assert!(!snapshot_path(dir.path(), "tiny", 5).exists());

    drop(transfer);
    let stats: Vec<_> = rx.iter().collect();
    assert_eq!(stats.iter().map(|s| s.iteration).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    assert!(stats.iter().all(|s| s.total_iterations == 5 && s.learning_rate == 1e-5));
    assert_eq!(stats.iter().filter(|s| s.snapshot.is_some()).count(), 2);
    assert!((stats[0].loss - initial.total).abs() <= 1e-9 * initial.total.abs().max(1.0));
}

#[test]
fn stop_flag_prevents_any_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let config = TransferConfig {
        stop_flag: Some(Arc::new(AtomicBool::new(true))),
        ..gentle_config(dir.path())
    };
    let mut transfer = StyleTransfer::new(
        tiny_network(), &preprocess(&content_image()), &preprocess(&style_image()), config,
    ).unwrap();

    let outcome = transfer.run().unwrap();
    assert_eq!(outcome.iterations_completed, 0);
    assert!(outcome.snapshots.is_empty());
}

#[test]
fn dropped_receiver_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, rx) = mpsc::channel();
    drop(rx);
    let config = TransferConfig { progress_tx: Some(tx), ..gentle_config(dir.path()) };
    let mut transfer = StyleTransfer::new(
        tiny_network(), &preprocess(&content_image()), &preprocess(&style_image()), config,
    ).unwrap();

    assert_eq!(transfer.run().unwrap().iterations_completed, 1);
}

#[test]
fn mismatched_image_shapes_are_rejected() {
    let content = preprocess(&content_image());
    let style = Tensor3::zeros(3, 8, 16);
    let err = StyleTransfer::new(tiny_network(), &content, &style, TransferConfig::default()).err();
    assert!(matches!(err, Some(StyleError::ShapeMismatch { .. })));
}

#[test]
fn unknown_layers_are_rejected() {
    let config = TransferConfig { content_layer: "fc7".to_owned(), ..TransferConfig::default() };
    let img = preprocess(&content_image());
    let err = StyleTransfer::new(tiny_network(), &img, &img, config).err();
    assert!(matches!(err, Some(StyleError::UnknownLayer(name)) if name == "fc7"));
}

#[test]
fn images_are_resized_to_the_configured_height() {
    let dir = tempfile::tempdir().unwrap();
    let content = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, Rgb([10, 20, 30])));
    let style = DynamicImage::ImageRgb8(style_image());
    let config = TransferConfig { image_height: 16, ..gentle_config(dir.path()) };

    let transfer = StyleTransfer::from_images(tiny_network(), &content, &style, config).unwrap();
    assert_eq!(transfer.generated().shape(), (3, 16, 32));
}

#[test]
fn run_from_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let content_path = dir.path().join("content.png");
    let style_path = dir.path().join("style.jpg");
    content_image().save(&content_path).unwrap();
    style_image().save(&style_path).unwrap();

    let out = dir.path().join("out");
    let config = TransferConfig { iterations: 2, image_height: 16, ..gentle_config(&out) };
    let outcome = run_style_transfer(tiny_network(), &content_path, &style_path, config).unwrap();

    assert_eq!(outcome.iterations_completed, 2);
    assert_eq!(outcome.snapshots, vec![snapshot_path(&out, "tiny", 2)]);
    assert!(out.join("tiny_at_iteration_2.png").exists());
}

#[test]
fn missing_input_file_surfaces_an_image_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.png");
    let err = run_style_transfer(tiny_network(), &missing, &missing, gentle_config(dir.path())).unwrap_err();
    assert!(matches!(err, StyleError::Image(_)));
}

#[test]
fn non_rgb_networks_are_rejected_before_running() {
    let mut spec = NetworkSpec::vgg19_scaled(32).with_pooling(PoolKind::Average);
    spec.input_channels = 1;
    let network = Network::from_spec(&spec, 5);
    let gray = Tensor3::from_vec(1, 16, 16, (0..256).map(|i| i as f64 - 128.0).collect()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = TransferConfig { save_every: 1, ..gentle_config(dir.path()) };
    let err = StyleTransfer::new(network, &gray, &gray, config).err();
    assert!(matches!(err, Some(StyleError::ShapeMismatch { context: "content image", .. })));
}

#[test]
fn non_finite_loss_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut content = preprocess(&content_image());
    content.data[5] = f64::NAN;
    let config = TransferConfig { iterations: 3, save_every: 1, ..gentle_config(dir.path()) };
    let mut transfer = StyleTransfer::new(tiny_network(), &content, &preprocess(&style_image()), config).unwrap();

    let outcome = transfer.run().unwrap();
    assert_eq!(outcome.iterations_completed, 3);
    assert!(!outcome.final_loss.total.is_finite());
    assert_eq!(outcome.snapshots, (1..=3).map(|i| snapshot_path(dir.path(), "tiny", i)).collect::<Vec<_>>());
    for path in &outcome.snapshots {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (16, 16));
    }
}

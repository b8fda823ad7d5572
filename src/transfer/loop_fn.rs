use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{Result, StyleError};
use crate::imaging::io::{resize_rgb, target_dimensions};
use crate::imaging::preprocess::preprocess;
use crate::loss::combined::{evaluate, LossBreakdown, StyleTargets};
use crate::math::tensor::Tensor3;
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::transfer::iteration_stats::IterationStats;
use crate::transfer::snapshot::{is_checkpoint, snapshot_path, write_snapshot};
use crate::transfer::transfer_config::TransferConfig;

/// Summary returned by [`StyleTransfer::run`].
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Loss of the last completed iteration.
    pub final_loss: LossBreakdown,
    pub iterations_completed: usize,
    pub snapshots: Vec<PathBuf>,
}

/// One style-transfer optimization: a frozen network, the fixed targets, and
/// the generated image it owns and mutates.
pub struct StyleTransfer {
    network: Network,
    targets: StyleTargets,
    layers: Vec<String>,
    generated: Tensor3,
    optimizer: Sgd,
    config: TransferConfig,
    iteration: usize,
}

impl StyleTransfer {
    /// Prepares a run from already-preprocessed tensors of equal shape.
    ///
    /// The content and style activations are fixed for the whole run, so the
    /// targets are extracted once here. The generated image starts as a copy
    /// of `content`.
    pub fn new(mut network: Network, content: &Tensor3, style: &Tensor3, config: TransferConfig) -> Result<StyleTransfer> {
        config.validate()?;
        if content.channels != 3 {
            return Err(StyleError::ShapeMismatch {
                context: "content image",
                expected: "3 channels (BGR)".to_owned(),
                actual: format!("{} channels", content.channels),
            });
        }
        if content.channels != network.input_channels {
            return Err(StyleError::ShapeMismatch {
                context: "content image",
                expected: format!("{} channels", network.input_channels),
                actual: format!("{} channels", content.channels),
            });
        }
        if content.shape() != style.shape() {
            return Err(StyleError::ShapeMismatch {
                context: "style image",
                expected: format!("{:?} (content shape)", content.shape()),
                actual: format!("{:?}", style.shape()),
            });
        }

        let content_layers = vec![config.content_layer.clone()];
        let content_acts = network.forward(content, &content_layers)?;
        let style_acts = network.forward(style, &config.style_layers)?;
        let targets = StyleTargets::new(&config.content_layer, &config.style_layers, &content_acts, &style_acts)?;
        let layers = targets.layer_names();

        Ok(StyleTransfer {
            network,
            targets,
            layers,
            generated: content.clone(),
            optimizer: Sgd::new(config.schedule),
            config,
            iteration: 0,
        })
    }

    /// Resizes both images to the configured height (width from the content
    /// image's aspect ratio), preprocesses them and prepares the run.
    pub fn from_images(network: Network, content: &DynamicImage, style: &DynamicImage, config: TransferConfig) -> Result<StyleTransfer> {
        let (w, h) = target_dimensions(content.width(), content.height(), config.image_height)?;
        info!(width = w, height = h, "resizing inputs");
        let content = preprocess(&resize_rgb(content, w, h));
        let style = preprocess(&resize_rgb(style, w, h));
        StyleTransfer::new(network, &content, &style, config)
    }

    /// The current generated image, in preprocessed space.
    pub fn generated(&self) -> &Tensor3 {
        &self.generated
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Evaluates the loss of the current image without updating it.
    pub fn loss(&mut self) -> Result<LossBreakdown> {
        let acts = self.network.forward(&self.generated, &self.layers)?;
        Ok(evaluate(&self.targets, &self.config.weights, &acts, &self.generated)?.breakdown)
    }

    /// One iteration: loss, gradient with respect to the generated pixels,
    /// one SGD step. Returns the pre-update loss and the learning rate used.
    pub fn step(&mut self) -> Result<(LossBreakdown, f64)> {
        let acts = self.network.forward(&self.generated, &self.layers)?;
        let eval = evaluate(&self.targets, &self.config.weights, &acts, &self.generated)?;

        let mut grad = self.network.backward(&eval.feature_grads, self.generated.shape())?;
        grad.add_assign(&eval.pixel_grad);

        let lr = self.optimizer.step(&mut self.generated, &grad);
        self.iteration += 1;
        Ok((eval.breakdown, lr))
    }

    /// Runs until `config.iterations` have completed, writing snapshots at the
    /// configured interval.
    ///
    /// # Early termination
    /// The loop also ends if the `progress_tx` receiver has been dropped or
    /// `stop_flag` is set. A non-finite loss is logged and the loop continues.
    pub fn run(&mut self) -> Result<TransferOutcome> {
        if self.config.save_every > 0 {
            std::fs::create_dir_all(&self.config.output_dir)?;
        }
        info!(
            iterations = self.config.iterations,
            content_layer = %self.config.content_layer,
            style_layers = self.config.style_layers.len(),
            "starting style transfer"
        );

        let mut final_loss = LossBreakdown::default();
        let mut snapshots = Vec::new();
        let mut warned_non_finite = false;

        while self.iteration < self.config.iterations {
            if self.stop_requested() {
                info!(iteration = self.iteration, "stop requested");
                break;
            }

            let t_start = Instant::now();
            let (loss, learning_rate) = self.step()?;
            final_loss = loss;
            let iteration = self.iteration;

            if !loss.total.is_finite() && !warned_non_finite {
                warn!(iteration, loss = loss.total, "loss is not finite");
                warned_non_finite = true;
            }
            debug!(iteration, loss = loss.total, learning_rate, "iteration done");

            let snapshot = if is_checkpoint(iteration, self.config.save_every) {
                let path = snapshot_path(&self.config.output_dir, &self.config.prefix, iteration);
                write_snapshot(&self.generated, &path)?;
                info!(iteration, loss = loss.total, path = %path.display(), "saved snapshot");
                snapshots.push(path.clone());
                Some(path)
            } else {
                None
            };

            let stats = IterationStats {
                iteration,
                total_iterations: self.config.iterations,
                loss: loss.total,
                content_loss: loss.content,
                style_loss: loss.style,
                tv_loss: loss.total_variation,
                learning_rate,
                elapsed_ms: t_start.elapsed().as_millis() as u64,
                snapshot,
            };

            if let Some(ref tx) = self.config.progress_tx {
                // If the receiver has been dropped, stop.
                if tx.send(stats).is_err() {
                    info!(iteration, "progress receiver dropped");
                    break;
                }
            }
        }

        Ok(TransferOutcome {
            final_loss,
            iterations_completed: self.iteration,
            snapshots,
        })
    }

    fn stop_requested(&self) -> bool {
        self.config.stop_flag.as_ref().map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

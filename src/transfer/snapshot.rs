use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::imaging::io::save_image;
use crate::imaging::preprocess::deprocess;
use crate::math::tensor::Tensor3;

/// `{dir}/{prefix}_at_iteration_{iteration}.png`
pub fn snapshot_path(dir: &Path, prefix: &str, iteration: usize) -> PathBuf {
    dir.join(format!("{}_at_iteration_{}.png", prefix, iteration))
}

/// True when a snapshot is due after `iteration` (1-based).
pub fn is_checkpoint(iteration: usize, save_every: usize) -> bool {
    save_every > 0 && iteration % save_every == 0
}

/// Deprocesses the generated tensor and writes it as PNG.
pub fn write_snapshot(generated: &Tensor3, path: &Path) -> Result<()> {
    save_image(&deprocess(generated), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_carry_the_iteration() {
        let p = snapshot_path(Path::new("out"), "paris", 300);
        assert_eq!(p, Path::new("out").join("paris_at_iteration_300.png"));
    }

    #[test]
    fn checkpoints_follow_interval() {
        assert!(!is_checkpoint(99, 100));
        assert!(is_checkpoint(100, 100));
        assert!(!is_checkpoint(100, 0));
    }
}

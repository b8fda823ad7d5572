use std::path::Path;

use image::{imageops::FilterType, DynamicImage, RgbImage};

use crate::error::{Result, StyleError};

/// Decodes an image file (PNG/JPEG/BMP/GIF).
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Working size for an image of `width × height` scaled to `target_height`
/// rows, preserving aspect ratio (width rounded down).
pub fn target_dimensions(width: u32, height: u32, target_height: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 || target_height == 0 {
        return Err(StyleError::InvalidConfig(format!(
            "cannot scale a {}x{} image to height {}",
            width, height, target_height
        )));
    }
    let scaled = u64::from(width) * u64::from(target_height) / u64::from(height);
    let scaled = u32::try_from(scaled).map_err(|_| StyleError::InvalidConfig(format!(
        "scaling a {}x{} image to height {} gives a width of {} pixels",
        width, height, target_height, scaled
    )))?;
    Ok((scaled.max(1), target_height))
}

/// Resizes to exactly `width × height` and drops alpha.
pub fn resize_rgb(img: &DynamicImage, width: u32, height: u32) -> RgbImage {
    img.resize_exact(width, height, FilterType::Lanczos3).to_rgb8()
}

/// Writes an RGB image; the format follows the file extension.
pub fn save_image<P: AsRef<Path>>(img: &RgbImage, path: P) -> Result<()> {
    img.save(path)?;
    Ok(())
}

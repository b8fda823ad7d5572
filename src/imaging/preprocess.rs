use image::{Rgb, RgbImage};

use crate::math::tensor::Tensor3;

/// ImageNet per-channel means in BGR order, subtracted before the network.
pub const BGR_MEAN: [f64; 3] = [103.939, 116.779, 123.68];

/// Converts an RGB image into the network's input space: channel-major BGR
/// with the ImageNet means subtracted. No rescaling to [0, 1].
pub fn preprocess(img: &RgbImage) -> Tensor3 {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    let mut t = Tensor3::zeros(3, h, w);
    for (x, y, px) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            // BGR channel c reads RGB channel 2 - c.
            t.set(c, y, x, f64::from(px.0[2 - c]) - BGR_MEAN[c]);
        }
    }
    t
}

/// Inverse of [`preprocess`]: adds the means back, swaps to RGB, and clips to
/// the byte range. Any input, including NaN or infinities, yields valid bytes.
pub fn deprocess(t: &Tensor3) -> RgbImage {
    assert_eq!(t.channels, 3, "deprocess expects a 3-channel tensor");
    RgbImage::from_fn(t.width as u32, t.height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let mut px = [0u8; 3];
        for c in 0..3 {
            px[2 - c] = to_byte(t.get(c, y, x) + BGR_MEAN[c]);
        }
        Rgb(px)
    })
}

fn to_byte(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0).round() as u8
}

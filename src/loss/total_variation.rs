use crate::math::tensor::Tensor3;

/// Exponent applied to each local squared-gradient magnitude.
pub const TV_EXPONENT: f64 = 1.25;

/// Smoothness regularizer on the generated image.
///
/// For every pixel except the last row and column, with
/// `a = (x[y,x] - x[y+1,x])²` and `b = (x[y,x] - x[y,x+1])²`, accumulates
/// `(a + b)^1.25`, per channel.
pub struct TotalVariationLoss;

impl TotalVariationLoss {
    pub fn loss(image: &Tensor3) -> f64 {
        let mut total = 0.0;
        for c in 0..image.channels {
            for y in 0..image.height.saturating_sub(1) {
                for x in 0..image.width.saturating_sub(1) {
                    let v = image.get(c, y, x);
                    let a = (v - image.get(c, y + 1, x)).powi(2);
                    let b = (v - image.get(c, y, x + 1)).powi(2);
                    total += (a + b).powf(TV_EXPONENT);
                }
            }
        }
        total
    }

    pub fn derivative(image: &Tensor3) -> Tensor3 {
        let mut grad = Tensor3::zeros(image.channels, image.height, image.width);
        for c in 0..image.channels {
            for y in 0..image.height.saturating_sub(1) {
                for x in 0..image.width.saturating_sub(1) {
                    let v = image.get(c, y, x);
                    let dv = v - image.get(c, y + 1, x);
                    let dh = v - image.get(c, y, x + 1);
                    let t = dv * dv + dh * dh;
                    if t == 0.0 {
                        continue;
                    }
                    // d/dt t^1.25 = 1.25 t^0.25
                    let k = TV_EXPONENT * t.powf(TV_EXPONENT - 1.0) * 2.0;
                    let here = grad.index(c, y, x);
                    let below = grad.index(c, y + 1, x);
                    let right = grad.index(c, y, x + 1);
                    grad.data[here] += k * (dv + dh);
                    grad.data[below] -= k * dv;
                    grad.data[right] -= k * dh;
                }
            }
        }
        grad
    }
}

use ferrite_style::imaging::{deprocess, preprocess};
use ferrite_style::loss::{gram_matrix, ContentLoss, StyleLoss, TotalVariationLoss};
use ferrite_style::Tensor3;
use image::{Rgb, RgbImage};

fn pseudo_random(c: usize, h: usize, w: usize, seed: u64) -> Tensor3 {
    // Small LCG so the fixtures are deterministic.
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let data = (0..c * h * w)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f64 / (1u64 << 31) as f64) * 200.0 - 100.0
        })
        .collect();
    Tensor3::from_vec(c, h, w, data).unwrap()
}

#[test]
fn content_loss_is_zero_only_for_identical_tensors() {
    for seed in 0..5 {
        let a = pseudo_random(4, 5, 6, seed);
        assert_eq!(ContentLoss::loss(&a, &a), 0.0);

        let mut b = a.clone();
        let idx = (seed as usize * 13) % b.data.len();
        b.data[idx] += 0.01;
        assert!(ContentLoss::loss(&a, &b) > 0.0);
    }
}

#[test]
fn style_loss_ignores_spatial_layout() {
    let f = pseudo_random(5, 4, 4, 11);
    let style = gram_matrix(&f);
    assert_eq!(StyleLoss::loss(&style, &f), 0.0);

    // Transpose every feature map: per-channel statistics are kept,
    // spatial arrangement is not.
    let mut transposed = f.clone();
    for c in 0..f.channels {
        for y in 0..f.height {
            for x in 0..f.width {
                transposed.set(c, x, y, f.get(c, y, x));
            }
        }
    }
    assert_ne!(transposed, f);
    assert!(StyleLoss::loss(&style, &transposed).abs() < 1e-9);

    let other = pseudo_random(5, 4, 4, 12);
    assert!(StyleLoss::loss(&style, &other) > 0.0);
}

#[test]
fn total_variation_separates_flat_from_textured() {
    let flat = Tensor3::from_vec(3, 6, 7, vec![-12.5; 126]).unwrap();
    assert_eq!(TotalVariationLoss::loss(&flat), 0.0);

    for seed in 0..3 {
        assert!(TotalVariationLoss::loss(&pseudo_random(3, 6, 7, seed)) > 0.0);
    }
}

#[test]
fn gram_matrices_are_symmetric() {
    for (c, h, w) in [(1, 1, 1), (3, 4, 5), (8, 2, 9)] {
        let g = gram_matrix(&pseudo_random(c, h, w, (c * h * w) as u64));
        assert!(g.is_symmetric(0.0));
        assert_eq!(g, g.transpose());
    }
}

#[test]
fn deprocess_always_yields_displayable_bytes() {
    let img = RgbImage::from_fn(5, 4, |x, y| Rgb([(x * 50) as u8, (y * 60) as u8, 17]));
    assert_eq!(deprocess(&preprocess(&img)), img);

    // Far outside the display range after the mean shift.
    let wild = pseudo_random(3, 4, 5, 99).scale(1e3);
    let out = deprocess(&wild);
    assert_eq!(out.dimensions(), (5, 4));
    for (x, y, px) in out.enumerate_pixels() {
        for c in 0..3 {
            let raw = wild.get(2 - c, y as usize, x as usize) + ferrite_style::imaging::BGR_MEAN[2 - c];
            let expected = if raw <= 0.0 { 0 } else if raw >= 255.0 { 255 } else { raw.round() as u8 };
            assert_eq!(px.0[c], expected);
        }
    }
}

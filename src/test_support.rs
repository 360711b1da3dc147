//! Synthetic fixture images for unit tests.

use image::{imageops, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Deterministic high-entropy image; different seeds do not correlate
pub fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 32) as u8
    };
    RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]))
}

/// Linear ramp in every channel. Any window of it correlates perfectly with
/// any other window, so crops of it still match. Keep both sides <= 256.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([x as u8, y as u8, ((x + y) / 2) as u8])
    })
}

/// White canvas with a `patch` x `patch` block of noise at `(inset, inset)`;
/// every corner of it is uniform
pub fn framed_noise(canvas: u32, inset: u32, patch: u32, seed: u64) -> RgbImage {
    let mut image = RgbImage::from_pixel(canvas, canvas, Rgb([255, 255, 255]));
    imageops::replace(
        &mut image,
        &noise_image(patch, patch, seed),
        i64::from(inset),
        i64::from(inset),
    );
    image
}

/// Save `image` under `dir`, encoding by the extension of `name`
pub fn write_image(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

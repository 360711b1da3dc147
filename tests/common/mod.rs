//! Synthetic fixtures shared by the integration tests.

#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, Rgb, RgbImage};
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

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

/// Low-frequency blend of plane waves: smooth, non-linear and distinct per
/// channel, the kind of content lossy re-encoding barely disturbs
pub fn smooth_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (f64::from(x), f64::from(y));
        let wave = |fx: f64, fy: f64, phase: f64| (TAU * (x / fx + y / fy) + phase).sin();
        let channel = |phase: f64| {
            let v = 128.0
                + 60.0 * wave(170.0, 260.0, phase)
                + 40.0 * wave(-310.0, 190.0, 2.0 * phase)
                + 15.0 * wave(90.0, -120.0, 3.0 * phase);
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb([channel(0.3), channel(2.1), channel(4.0)])
    })
}

/// Save `image` as a JPEG at the given quality
pub fn write_jpeg(dir: &Path, name: &str, image: &RgbImage, quality: u8) -> PathBuf {
    let path = dir.join(name);
    let file = std::io::BufWriter::new(std::fs::File::create(&path).unwrap());
    JpegEncoder::new_with_quality(file, quality)
        .encode_image(image)
        .unwrap();
    path
}

/// Folder layout used by batch evaluation
pub struct Corpus {
    pub root: TempDir,
    pub originals: PathBuf,
    pub modified: PathBuf,
    pub random: PathBuf,
}

impl Corpus {
    /// Two originals, a crop and a re-encode of them, and two unrelated images
    pub fn build() -> Self {
        let root = TempDir::new().unwrap();
        let originals = root.path().join("originals");
        let modified = root.path().join("modified");
        let random = root.path().join("random");
        for dir in [&originals, &modified, &random] {
            std::fs::create_dir(dir).unwrap();
        }

        let gradient = gradient_image(160, 120);
        let noise = noise_image(96, 64, 1);
        write_image(&originals, "gradient.png", &gradient);
        write_image(&originals, "noise.png", &noise);

        let crop = imageops::crop_imm(&gradient, 12, 10, 136, 100).to_image();
        write_image(&modified, "gradient_crop.png", &crop);
        write_image(&modified, "noise_reencoded.bmp", &noise);

        write_image(&random, "unrelated_a.png", &noise_image(80, 120, 7));
        write_image(&random, "unrelated_b.bmp", &noise_image(200, 50, 8));

        Self {
            root,
            originals,
            modified,
            random,
        }
    }
}

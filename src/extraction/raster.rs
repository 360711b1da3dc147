use image::{imageops, DynamicImage, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::core::signature::{RasterFacts, Template, TemplateSet};
use crate::core::types::{Anchor, ColorMode};
use crate::extraction::ExtractionConfig;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Decode an in-memory image, guessing the format from its magic bytes
///
/// # Errors
///
/// Returns an error if the format is unknown or the data is corrupt.
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    Ok(image)
}

/// Read and decode a file into the 8-bit RGB working raster
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn decode_file(path: &Path) -> Result<RgbImage, DecodeError> {
    let bytes = std::fs::read(path)?;
    Ok(decode_bytes(&bytes)?.to_rgb8())
}

/// Dimensions, shape and intensity statistics of a working raster
#[must_use]
pub fn raster_facts(rgb: &RgbImage, color_mode: ColorMode) -> RasterFacts {
    let (width, height) = rgb.dimensions();
    let samples = rgb.as_raw();

    let (mean, std) = if samples.is_empty() {
        (0.0, 0.0)
    } else {
        let n = count_to_f64(samples.len());
        let mean = samples.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        (mean, variance.sqrt())
    };

    RasterFacts {
        width,
        height,
        color_mode,
        shape: [height, width, 3],
        mean_intensity: mean,
        std_intensity: std,
    }
}

/// Sample the anchored templates of a working raster.
///
/// Returns `None` when the image is too small for a template of at least one
/// pixel. Anchors whose window would leave the raster are skipped.
#[must_use]
pub fn sample_templates(rgb: &RgbImage, config: &ExtractionConfig) -> Option<TemplateSet> {
    let (width, height) = rgb.dimensions();
    let size = config.template_size(width, height);
    if size == 0 {
        return None;
    }

    let templates: Vec<Template> = Anchor::ALL
        .iter()
        .filter_map(|&anchor| {
            let (row, col) = anchor.origin(i64::from(height), i64::from(width), i64::from(size));
            if row < 0
                || col < 0
                || row + i64::from(size) > i64::from(height)
                || col + i64::from(size) > i64::from(width)
            {
                return None;
            }
            let x = u32::try_from(col).ok()?;
            let y = u32::try_from(row).ok()?;
            let pixels = imageops::crop_imm(rgb, x, y, size, size)
                .to_image()
                .into_raw();
            Some(Template {
                anchor,
                x,
                y,
                pixels,
            })
        })
        .collect();

    if templates.is_empty() {
        None
    } else {
        Some(TemplateSet { size, templates })
    }
}

//! Signature extraction.
//!
//! [`compute_signature`] reads a file once and fills in each field group of a
//! [`Signature`] independently. Only an unreadable path stops extraction; a
//! raster that fails to decode leaves the file facts, capture metadata and
//! fuzzy digest in place and records the failure in `error`.
//!
//! - [`raster`]: decoding, intensity statistics, template sampling
//! - [`capture`]: embedded EXIF metadata

pub mod capture;
pub mod raster;

use chrono::{DateTime, Utc};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::signature::{FileFacts, Signature};
use crate::core::types::ColorMode;
use crate::similarity::fuzzy;
use raster::DecodeError;

/// Largest template edge in pixels
pub const DEFAULT_MAX_TEMPLATE_SIZE: u32 = 64;

/// Templates never exceed this fraction of the image's shorter side
pub const DEFAULT_TEMPLATE_DIVISOR: u32 = 4;

/// Image extensions picked up by folder registration, compared case-insensitively
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub max_template_size: u32,
    pub template_divisor: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_template_size: DEFAULT_MAX_TEMPLATE_SIZE,
            template_divisor: DEFAULT_TEMPLATE_DIVISOR,
        }
    }
}

impl ExtractionConfig {
    /// Template edge for a `width` x `height` image; 0 means no templates
    #[must_use]
    pub fn template_size(&self, width: u32, height: u32) -> u32 {
        width
            .min(height)
            .checked_div(self.template_divisor)
            .unwrap_or(0)
            .min(self.max_template_size)
    }
}

/// True if `path` carries one of the supported image extensions
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Supported images directly inside `folder`, sorted by path
///
/// # Errors
///
/// Returns an error if the folder cannot be listed.
pub fn list_images(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Extract a signature with the default configuration
#[must_use]
pub fn compute_signature(path: &Path) -> Signature {
    compute_signature_with(path, &ExtractionConfig::default())
}

/// Extract a signature. Never fails; see the module docs for how partial
/// results are reported.
#[must_use]
pub fn compute_signature_with(path: &Path, config: &ExtractionConfig) -> Signature {
    extract(path, config).0
}

/// Extract a signature and keep the decoded working raster alongside it, so
/// callers that correlate against the file do not read it a second time
#[must_use]
pub fn extract(path: &Path, config: &ExtractionConfig) -> (Signature, Result<RgbImage, DecodeError>) {
    let mut signature = Signature::new(path);

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Cannot read {}: {e}", path.display());
            signature.error = Some(format!("Cannot read file: {e}"));
            return (signature, Err(DecodeError::Io(e)));
        }
    };

    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);

    signature.file = Some(FileFacts {
        size: bytes.len() as u64,
        modified,
        md5: format!("{:x}", md5::compute(&bytes)),
    });
    signature.exif = capture::read_capture_metadata(&bytes);
    signature.fuzzy_digest = Some(fuzzy::hash(&bytes));

    let raster = match raster::decode_bytes(&bytes) {
        Ok(image) => {
            let color_mode = ColorMode::from(image.color());
            let rgb = image.to_rgb8();
            signature.raster = Some(raster::raster_facts(&rgb, color_mode));
            signature.templates = raster::sample_templates(&rgb, config);
            Ok(rgb)
        }
        Err(e) => {
            warn!("{}: {e}", path.display());
            signature.error = Some(e.to_string());
            Err(e)
        }
    };

    debug!(
        "Extracted {}: {} bytes, {} templates, {} EXIF tags",
        signature.file_name,
        bytes.len(),
        signature.template_count(),
        signature.exif.len()
    );

    (signature, raster)
}

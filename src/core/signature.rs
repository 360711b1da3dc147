use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::types::{Anchor, ColorMode};

/// Facts read from the file itself, independent of its image content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFacts {
    /// Size in bytes
    pub size: u64,

    /// Last modification time, when the platform reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,

    /// MD5 of the raw bytes, lowercase hex. Informational only, never scored.
    pub md5: String,
}

/// Facts that exist only when the raster decoded successfully
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterFacts {
    pub width: u32,
    pub height: u32,

    /// Native color layout reported by the codec
    pub color_mode: ColorMode,

    /// Shape of the 8-bit, three-channel working raster: `[height, width, channels]`
    pub shape: [u32; 3],

    /// Mean over every channel value of the working raster
    pub mean_intensity: f64,

    /// Population standard deviation over every channel value
    pub std_intensity: f64,
}

impl RasterFacts {
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Height over width. `None` for a zero-width raster.
    #[must_use]
    pub fn aspect(&self) -> Option<f64> {
        if self.width == 0 {
            None
        } else {
            Some(f64::from(self.height) / f64::from(self.width))
        }
    }
}

/// A square RGB patch sampled from a fixed anchor of a reference image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub anchor: Anchor,

    /// Column of the patch's top-left corner in the source raster
    pub x: u32,

    /// Row of the patch's top-left corner in the source raster
    pub y: u32,

    /// Row-major RGB8 samples, `size * size * 3` bytes
    pub pixels: Vec<u8>,
}

impl Template {
    /// Rebuild the patch as an image. `None` if the stored samples do not
    /// describe a `size` x `size` RGB patch.
    #[must_use]
    pub fn to_image(&self, size: u32) -> Option<RgbImage> {
        if size == 0 || self.pixels.is_empty() {
            return None;
        }
        RgbImage::from_raw(size, size, self.pixels.clone())
    }
}

/// Up to five equally sized templates from one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSet {
    /// Edge length shared by every template, always >= 1
    pub size: u32,
    pub templates: Vec<Template>,
}

impl TemplateSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The comparable fingerprint of one image.
///
/// Every group of fields is optional on its own: a signature whose raster
/// failed to decode still carries its file facts and fuzzy digest, and each
/// rule scores only the fields it finds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Path the signature was extracted from
    pub path: PathBuf,

    /// Final path component
    pub file_name: String,

    /// Absent only when the file could not be read at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileFacts>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raster: Option<RasterFacts>,

    /// Capture metadata, tag name to displayed value. Often empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exif: BTreeMap<String, String>,

    /// Context-triggered piecewise hash of the raw bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzzy_digest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<TemplateSet>,

    /// First extraction failure, if any step failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Signature {
    /// An identity-only signature. Extraction fills in the rest.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Self {
            path: path.to_path_buf(),
            file_name,
            file: None,
            raster: None,
            exif: BTreeMap::new(),
            fuzzy_digest: None,
            templates: None,
            error: None,
        }
    }

    /// True when not even the file bytes were available
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        self.file.is_none()
    }

    /// True when any extraction step failed
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates.as_ref().map_or(0, TemplateSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_signature_is_identity_only() {
        let sig = Signature::new(Path::new("/data/originals/cat.jpg"));
        assert_eq!(sig.file_name, "cat.jpg");
        assert!(sig.is_unreadable());
        assert!(!sig.is_degraded());
        assert_eq!(sig.template_count(), 0);
        assert!(sig.exif.is_empty());
    }

    #[test]
    fn test_raster_area_and_aspect() {
        let raster = RasterFacts {
            width: 200,
            height: 100,
            color_mode: ColorMode::Rgb,
            shape: [100, 200, 3],
            mean_intensity: 0.0,
            std_intensity: 0.0,
        };
        assert_eq!(raster.area(), 20_000);
        assert!((raster.aspect().unwrap() - 0.5).abs() < f64::EPSILON);

        let degenerate = RasterFacts { width: 0, ..raster };
        assert!(degenerate.aspect().is_none());
    }

    #[test]
    fn test_template_to_image() {
        let template = Template {
            anchor: Anchor::Center,
            x: 0,
            y: 0,
            pixels: vec![7; 2 * 2 * 3],
        };
        let img = template.to_image(2).unwrap();
        assert_eq!(img.dimensions(), (2, 2));

        // Wrong size for the stored samples
        assert!(template.to_image(3).is_none());
        assert!(template.to_image(0).is_none());
    }

    #[test]
    fn test_signature_json_roundtrip_keeps_templates() {
        let mut sig = Signature::new(Path::new("a.png"));
        sig.templates = Some(TemplateSet {
            size: 1,
            templates: vec![Template {
                anchor: Anchor::TopLeft,
                x: 0,
                y: 0,
                pixels: vec![1, 2, 3],
            }],
        });
        let json = serde_json::to_string(&sig).unwrap();
        let restored: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, sig);
    }
}

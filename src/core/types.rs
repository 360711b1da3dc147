use serde::{Deserialize, Serialize};

/// Point budget of the metadata rule
pub const METADATA_MAX_SCORE: u32 = 30;

/// Point budget of the fuzzy-hash rule
pub const FUZZY_HASH_MAX_SCORE: u32 = 10;

/// Point budget of the template-matching rule
pub const TEMPLATE_MAX_SCORE: u32 = 60;

/// Sum of all rule budgets
pub const MAX_TOTAL_SCORE: u32 = METADATA_MAX_SCORE + FUZZY_HASH_MAX_SCORE + TEMPLATE_MAX_SCORE;

/// Default acceptance threshold for the aggregate score
pub const DEFAULT_MATCH_THRESHOLD: u32 = 60;

/// Color layout of a decoded raster, named after the conventional mode codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Single luminance channel ("L")
    Luma,
    /// Luminance plus alpha ("LA")
    LumaAlpha,
    /// Three color channels ("RGB")
    Rgb,
    /// Three color channels plus alpha ("RGBA")
    Rgba,
    /// Anything the codec reports that has no conventional code
    Other(String),
}

impl ColorMode {
    /// RGB and RGBA are interchangeable for derivative detection: an alpha
    /// channel is routinely added or dropped by re-encoding.
    #[must_use]
    pub fn is_color(&self) -> bool {
        matches!(self, Self::Rgb | Self::Rgba)
    }
}

impl From<image::ColorType> for ColorMode {
    fn from(color: image::ColorType) -> Self {
        use image::ColorType;

        match color {
            ColorType::L8 | ColorType::L16 => Self::Luma,
            ColorType::La8 | ColorType::La16 => Self::LumaAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => Self::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => Self::Rgba,
            other => Self::Other(format!("{other:?}")),
        }
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Luma => write!(f, "L"),
            Self::LumaAlpha => write!(f, "LA"),
            Self::Rgb => write!(f, "RGB"),
            Self::Rgba => write!(f, "RGBA"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Fixed sampling position of a template patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl Anchor {
    /// Sampling order used during extraction
    pub const ALL: [Anchor; 5] = [
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
        Anchor::Center,
    ];

    /// Top-left `(row, col)` of a `size` window anchored in a `height` x `width`
    /// raster. May be negative or overflow the raster; callers bounds-check.
    #[must_use]
    pub fn origin(self, height: i64, width: i64, size: i64) -> (i64, i64) {
        match self {
            Self::TopLeft => (0, 0),
            Self::TopRight => (0, width - size),
            Self::BottomLeft => (height - size, 0),
            Self::BottomRight => (height - size, width - size),
            Self::Center => (height / 2 - size / 2, width / 2 - size / 2),
        }
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopLeft => write!(f, "top-left"),
            Self::TopRight => write!(f, "top-right"),
            Self::BottomLeft => write!(f, "bottom-left"),
            Self::BottomRight => write!(f, "bottom-right"),
            Self::Center => write!(f, "center"),
        }
    }
}

/// The three scoring rules. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Metadata,
    FuzzyHash,
    TemplateMatching,
}

impl RuleKind {
    /// One-based position in reports
    #[must_use]
    pub fn number(self) -> u32 {
        match self {
            Self::Metadata => 1,
            Self::FuzzyHash => 2,
            Self::TemplateMatching => 3,
        }
    }

    #[must_use]
    pub fn max_score(self) -> u32 {
        match self {
            Self::Metadata => METADATA_MAX_SCORE,
            Self::FuzzyHash => FUZZY_HASH_MAX_SCORE,
            Self::TemplateMatching => TEMPLATE_MAX_SCORE,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata => write!(f, "Metadata"),
            Self::FuzzyHash => write!(f, "Fuzzy Hash"),
            Self::TemplateMatching => write!(f, "Template"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budgets_sum_to_hundred() {
        assert_eq!(MAX_TOTAL_SCORE, 100);
        assert_eq!(
            RuleKind::Metadata.max_score()
                + RuleKind::FuzzyHash.max_score()
                + RuleKind::TemplateMatching.max_score(),
            MAX_TOTAL_SCORE
        );
    }

    #[test]
    fn test_color_mode_from_color_type() {
        assert_eq!(ColorMode::from(image::ColorType::L8), ColorMode::Luma);
        assert_eq!(ColorMode::from(image::ColorType::La16), ColorMode::LumaAlpha);
        assert_eq!(ColorMode::from(image::ColorType::Rgb8), ColorMode::Rgb);
        assert_eq!(ColorMode::from(image::ColorType::Rgba8), ColorMode::Rgba);
        assert_eq!(ColorMode::Rgba.to_string(), "RGBA");
    }

    #[test]
    fn test_color_compatibility() {
        assert!(ColorMode::Rgb.is_color());
        assert!(ColorMode::Rgba.is_color());
        assert!(!ColorMode::Luma.is_color());
        assert!(!ColorMode::Other("P".to_string()).is_color());
    }

    #[test]
    fn test_anchor_origins() {
        assert_eq!(Anchor::TopLeft.origin(100, 200, 25), (0, 0));
        assert_eq!(Anchor::TopRight.origin(100, 200, 25), (0, 175));
        assert_eq!(Anchor::BottomLeft.origin(100, 200, 25), (75, 0));
        assert_eq!(Anchor::BottomRight.origin(100, 200, 25), (75, 175));
        assert_eq!(Anchor::Center.origin(100, 200, 25), (38, 88));
    }
}

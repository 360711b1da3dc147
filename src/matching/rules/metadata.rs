//! Coarse file and raster properties: byte size, area and aspect, color mode.

use crate::core::signature::{RasterFacts, Signature};
use crate::core::types::{ColorMode, RuleKind, METADATA_MAX_SCORE};
use crate::matching::scoring::RuleOutcome;

/// Score at which the rule is reported as fired
pub const FIRE_THRESHOLD: u32 = METADATA_MAX_SCORE / 2;

#[inline]
#[allow(clippy::cast_precision_loss)]
fn ratio(a: u64, b: u64) -> f64 {
    let (lo, hi) = (a.min(b), a.max(b));
    if hi == 0 {
        1.0
    } else {
        lo as f64 / hi as f64
    }
}

fn size_points(size_ratio: f64) -> u32 {
    if size_ratio > 0.9 {
        10
    } else if size_ratio > 0.7 {
        8
    } else if size_ratio > 0.5 {
        4
    } else {
        0
    }
}

fn dimension_points(area_ratio: f64, aspect_diff: f64) -> u32 {
    if area_ratio > 0.8 && aspect_diff < 0.1 {
        12
    } else if area_ratio > 0.6 && aspect_diff < 0.2 {
        9
    } else if area_ratio > 0.4 {
        6
    } else {
        0
    }
}

/// Relative difference of the height/width ratios. A degenerate raster
/// counts as maximally different.
fn aspect_difference(a: &RasterFacts, b: &RasterFacts) -> f64 {
    match (a.aspect(), b.aspect()) {
        (Some(x), Some(y)) if x.max(y) > 0.0 => (x - y).abs() / x.max(y),
        _ => 1.0,
    }
}

fn mode_check(a: &ColorMode, b: &ColorMode) -> (u32, String) {
    if a == b {
        (8, format!("Mode match ({a}) -> 8/8 pts"))
    } else if a.is_color() && b.is_color() {
        (4, format!("Mode compatible ({a}/{b}) -> 4/8 pts"))
    } else {
        (0, format!("Mode mismatch ({a}/{b}) -> 0/8 pts"))
    }
}

/// Score the coarse properties both signatures carry. Each sub-check runs
/// only when both sides have its field.
#[must_use]
pub fn evaluate(probe: &Signature, reference: &Signature) -> RuleOutcome {
    let mut score = 0;
    let mut reasons = Vec::new();

    if let (Some(a), Some(b)) = (&probe.file, &reference.file) {
        let size_ratio = ratio(a.size, b.size);
        let points = size_points(size_ratio);
        score += points;
        reasons.push(format!("Size ratio {size_ratio:.3} -> {points}/10 pts"));
    }

    if let (Some(a), Some(b)) = (&probe.raster, &reference.raster) {
        let area_ratio = ratio(a.area(), b.area());
        let aspect_diff = aspect_difference(a, b);
        let points = dimension_points(area_ratio, aspect_diff);
        score += points;
        reasons.push(format!(
            "Dimension similarity {area_ratio:.3} -> {points}/12 pts"
        ));

        let (points, reason) = mode_check(&a.color_mode, &b.color_mode);
        score += points;
        reasons.push(reason);
    }

    let status = if score >= FIRE_THRESHOLD {
        "FIRED"
    } else {
        "NO MATCH"
    };
    let detail = if reasons.is_empty() {
        "no comparable metadata".to_string()
    } else {
        reasons.join(", ")
    };

    RuleOutcome::new(RuleKind::Metadata, score, format!("{status} - {detail}"))
}

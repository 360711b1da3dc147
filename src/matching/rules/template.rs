//! Localized visual correlation of the reference's anchored templates
//! against the full-resolution probe raster.
//!
//! Both the peak and the mean correlation must clear a band: one lucky
//! corner is not enough on its own.

use image::RgbImage;
use tracing::debug;

use crate::core::signature::Signature;
use crate::core::types::RuleKind;
use crate::extraction::raster::{self, DecodeError};
use crate::matching::scoring::RuleOutcome;
use crate::similarity::correlation;

/// `(min peak, min mean, points, status)`, checked in order
const BANDS: [(f64, f64, u32, &str); 3] = [
    (0.9, 0.7, 60, "EXACT MATCH"),
    (0.8, 0.6, 50, "GOOD MATCH"),
    (0.7, 0.5, 45, "MATCH"),
];

fn points(best: f64, mean: f64) -> (u32, &'static str) {
    BANDS
        .iter()
        .find(|(min_best, min_mean, _, _)| best >= *min_best && mean >= *min_mean)
        .map_or((0, "NO MATCH"), |&(_, _, points, status)| (points, status))
}

#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Decode the probe from its path and correlate it with the reference's
/// templates
///
/// # Errors
///
/// Returns an error if the probe file cannot be read or decoded.
pub fn evaluate(probe: &Signature, reference: &Signature) -> Result<RuleOutcome, DecodeError> {
    if reference.template_count() == 0 {
        return Ok(no_templates());
    }
    let image = raster::decode_file(&probe.path)?;
    Ok(evaluate_image(&image, reference))
}

/// Score against a probe raster decoded once for many references. A failed
/// decode only costs points when the reference has templates to correlate.
#[must_use]
pub fn evaluate_decoded(
    probe: Result<&RgbImage, &DecodeError>,
    reference: &Signature,
) -> RuleOutcome {
    if reference.template_count() == 0 {
        return no_templates();
    }
    match probe {
        Ok(image) => evaluate_image(image, reference),
        Err(e) => RuleOutcome::error(RuleKind::TemplateMatching, e),
    }
}

fn no_templates() -> RuleOutcome {
    RuleOutcome::new(
        RuleKind::TemplateMatching,
        0,
        "NO MATCH - no templates available",
    )
}

/// Correlate an already decoded probe raster with the reference's templates
#[must_use]
pub fn evaluate_image(probe: &RgbImage, reference: &Signature) -> RuleOutcome {
    let Some(set) = reference.templates.as_ref().filter(|set| !set.is_empty()) else {
        return no_templates();
    };

    let (anchors, patches): (Vec<_>, Vec<_>) = set
        .templates
        .iter()
        .filter_map(|template| Some((template.anchor, template.to_image(set.size)?)))
        .unzip();

    let peaks: Vec<f64> = anchors
        .iter()
        .zip(correlation::best_matches(probe, &patches))
        .filter_map(|(anchor, result)| match result {
            Ok(peak) => {
                debug!(
                    "{} {anchor} template: {:.3} at ({}, {})",
                    reference.file_name, peak.score, peak.x, peak.y
                );
                Some(peak.score)
            }
            Err(e) => {
                debug!("{} {anchor} template skipped: {e}", reference.file_name);
                None
            }
        })
        .collect();

    if peaks.is_empty() {
        return RuleOutcome::new(
            RuleKind::TemplateMatching,
            0,
            "NO MATCH - no valid template matches",
        );
    }

    let best = peaks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = peaks.iter().sum::<f64>() / count_to_f64(peaks.len());
    let (score, status) = points(best, mean);

    RuleOutcome::new(
        RuleKind::TemplateMatching,
        score,
        format!("{status} - correlation {best:.3} (avg: {mean:.3})"),
    )
}

use image::RgbImage;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::core::signature::Signature;
use crate::core::types::{RuleKind, DEFAULT_MATCH_THRESHOLD};
use crate::extraction::raster::DecodeError;
use crate::extraction::{extract, ExtractionConfig};
use crate::matching::rules::{fuzzy_hash, metadata, template};
use crate::matching::scoring::{Evidence, RuleOutcome};
use crate::registry::store::Registry;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MatchError {
    #[error("No reference images registered; register a folder before matching")]
    EmptyRegistry,
}

/// Configuration for the matcher
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum aggregate score for a comparison to count as a match
    pub match_threshold: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Result of matching one probe against the whole registry
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    /// File name of the probe
    pub probe: String,

    /// Reference with the strictly highest positive score
    pub best_match: Option<String>,

    /// Aggregate score of the top comparison, 0 to 100
    pub confidence: u32,

    /// Evidence of the top comparison, absent if the probe was unreadable
    pub evidence: Option<Evidence>,

    /// Why the probe could not be compared
    pub error: Option<String>,
}

impl MatchOutcome {
    fn unreadable(probe: &Signature) -> Self {
        Self {
            probe: probe.file_name.clone(),
            best_match: None,
            confidence: 0,
            evidence: None,
            error: probe.error.clone(),
        }
    }

    /// True if the top comparison cleared the match threshold
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.evidence.as_ref().is_some_and(|e| e.is_match)
    }
}

/// Compares probes against every registered reference
pub struct Matcher<'a> {
    registry: &'a Registry,
    config: MatchingConfig,
}

impl<'a> Matcher<'a> {
    /// Create a matcher with the default configuration
    #[must_use]
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            config: MatchingConfig::default(),
        }
    }

    /// Create a matcher with a custom configuration
    #[must_use]
    pub fn with_config(registry: &'a Registry, config: MatchingConfig) -> Self {
        Self { registry, config }
    }

    #[must_use]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Run all three rules for one probe/reference pair. The probe raster is
    /// decoded fresh from `probe.path`.
    #[must_use]
    pub fn compare(&self, probe: &Signature, reference: &Signature, reference_name: &str) -> Evidence {
        let template = template::evaluate(probe, reference)
            .unwrap_or_else(|e| RuleOutcome::error(RuleKind::TemplateMatching, &e));
        self.aggregate(probe, reference, reference_name, template)
    }

    fn compare_decoded(
        &self,
        probe: &Signature,
        probe_image: Result<&RgbImage, &DecodeError>,
        reference: &Signature,
        reference_name: &str,
    ) -> Evidence {
        let template = template::evaluate_decoded(probe_image, reference);
        self.aggregate(probe, reference, reference_name, template)
    }

    fn aggregate(
        &self,
        probe: &Signature,
        reference: &Signature,
        reference_name: &str,
        template: RuleOutcome,
    ) -> Evidence {
        let evidence = Evidence::aggregate(
            reference_name,
            metadata::evaluate(probe, reference),
            fuzzy_hash::evaluate(probe, reference),
            template,
            self.config.match_threshold,
        );

        debug!(
            "{} vs {}: metadata {}, fuzzy {}, template {} -> {}",
            probe.file_name,
            reference_name,
            evidence.metadata.score,
            evidence.fuzzy_hash.score,
            evidence.template.score,
            evidence.total_score
        );

        evidence
    }

    /// Compare a probe file against every reference and keep the best.
    ///
    /// References are visited in name order and only a strictly higher score
    /// replaces the current best, so ties go to the lexicographically first
    /// name. `best_match` stays `None` when no reference scores above zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is empty.
    pub fn find_best_match(&self, probe_path: &Path) -> Result<MatchOutcome, MatchError> {
        if self.registry.is_empty() {
            return Err(MatchError::EmptyRegistry);
        }

        let (probe, probe_image) = extract(probe_path, &ExtractionConfig::default());
        if probe.is_unreadable() {
            return Ok(MatchOutcome::unreadable(&probe));
        }

        let mut best: Option<Evidence> = None;
        for (name, reference) in self.registry.iter() {
            let evidence = self.compare_decoded(&probe, probe_image.as_ref(), reference, name);
            if best
                .as_ref()
                .map_or(true, |b| evidence.total_score > b.total_score)
            {
                best = Some(evidence);
            }
        }

        let confidence = best.as_ref().map_or(0, |e| e.total_score);
        let best_match = best
            .as_ref()
            .filter(|e| e.total_score > 0)
            .map(|e| e.reference.clone());

        Ok(MatchOutcome {
            probe: probe.file_name,
            best_match,
            confidence,
            evidence: best,
            error: probe.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::compute_signature;
    use crate::test_support::{framed_noise, gradient_image, noise_image, write_image};
    use image::imageops;
    use tempfile::TempDir;

    #[test]
    fn test_empty_registry_is_an_error() {
        let registry = Registry::new();
        let matcher = Matcher::new(&registry);
        let result = matcher.find_best_match(Path::new("anything.png"));
        assert_eq!(result.unwrap_err(), MatchError::EmptyRegistry);
    }

    #[test]
    fn test_identical_file_scores_hundred() {
        let dir = TempDir::new().unwrap();
        let path = write_image(dir.path(), "a.png", &noise_image(64, 48, 1));
        let sig = compute_signature(&path);

        let registry = Registry::new();
        let evidence = Matcher::new(&registry).compare(&sig, &sig, "a.png");

        assert_eq!(evidence.metadata.score, 30);
        assert_eq!(evidence.fuzzy_hash.score, 10);
        assert_eq!(evidence.template.score, 60);
        assert_eq!(evidence.total_score, 100);
        assert!(evidence.is_match);
    }

    #[test]
    fn test_uniform_corners_still_score_hundred() {
        let dir = TempDir::new().unwrap();
        let path = write_image(dir.path(), "framed.png", &framed_noise(200, 60, 80, 9));
        let sig = compute_signature(&path);
        assert_eq!(sig.template_count(), 5);

        let registry = Registry::new();
        let evidence = Matcher::new(&registry).compare(&sig, &sig, "framed.png");

        assert_eq!(
            evidence.template.reason,
            "EXACT MATCH - correlation 1.000 (avg: 1.000)"
        );
        assert_eq!(evidence.total_score, 100);
        assert!(evidence.is_match);
    }

    #[test]
    fn test_best_match_picks_source_of_crop() {
        let originals = TempDir::new().unwrap();
        let probes = TempDir::new().unwrap();

        let source = gradient_image(160, 120);
        write_image(originals.path(), "gradient.png", &source);
        write_image(originals.path(), "noise.png", &noise_image(160, 120, 2));

        let crop = imageops::crop_imm(&source, 10, 8, 140, 104).to_image();
        let probe = write_image(probes.path(), "crop.png", &crop);

        let mut registry = Registry::new();
        registry.register(originals.path()).unwrap();
        let outcome = Matcher::new(&registry).find_best_match(&probe).unwrap();

        assert_eq!(outcome.best_match.as_deref(), Some("gradient.png"));
        assert!(outcome.is_match(), "{outcome:?}");
        assert_eq!(outcome.evidence.unwrap().template.score, 60);
    }

    #[test]
    fn test_unreadable_probe_yields_zero_confidence() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "a.png", &noise_image(32, 32, 3));
        let mut registry = Registry::new();
        registry.register(dir.path()).unwrap();

        let outcome = Matcher::new(&registry)
            .find_best_match(&dir.path().join("missing.png"))
            .unwrap();
        assert_eq!(outcome.confidence, 0);
        assert!(outcome.best_match.is_none());
        assert!(outcome.evidence.is_none());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_ties_go_to_first_name() {
        let dir = TempDir::new().unwrap();
        let image = noise_image(48, 48, 4);
        let path = write_image(dir.path(), "probe.png", &image);
        let sig = compute_signature(&path);

        let mut registry = Registry::new();
        registry.insert("b_copy.png", sig.clone());
        registry.insert("a_copy.png", sig.clone());
        registry.insert("c_copy.png", sig);

        let outcome = Matcher::new(&registry).find_best_match(&path).unwrap();
        assert_eq!(outcome.best_match.as_deref(), Some("a_copy.png"));
        assert_eq!(outcome.confidence, 100);
    }

    #[test]
    fn test_custom_threshold() {
        let dir = TempDir::new().unwrap();
        let path = write_image(dir.path(), "a.png", &noise_image(48, 48, 5));
        let sig = compute_signature(&path);

        let mut registry = Registry::new();
        registry.insert("a.png", sig);
        let config = MatchingConfig {
            match_threshold: 101,
        };
        let outcome = Matcher::with_config(&registry, config)
            .find_best_match(&path)
            .unwrap();

        assert_eq!(outcome.confidence, 100);
        assert!(!outcome.is_match());
    }

    #[test]
    fn test_undecodable_probe_scores_template_error() {
        let dir = TempDir::new().unwrap();
        let reference_path = write_image(dir.path(), "ref.png", &noise_image(40, 40, 6));
        let reference = compute_signature(&reference_path);

        let probe_path = dir.path().join("probe.png");
        std::fs::write(&probe_path, b"not really a png").unwrap();
        let probe = compute_signature(&probe_path);

        let registry = Registry::new();
        let evidence = Matcher::new(&registry).compare(&probe, &reference, "ref.png");
        assert_eq!(evidence.template.score, 0);
        assert!(evidence.template.reason.starts_with("Error: "));
        assert!(!evidence.is_match);
    }
}

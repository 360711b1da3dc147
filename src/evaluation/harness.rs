use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::core::types::RuleKind;
use crate::matching::engine::Matcher;
use crate::matching::report;
use crate::matching::scoring::Evidence;

/// First line of the written report
pub const REPORT_TITLE: &str = " Digital Forensics Results";

#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_to_f64(part) / count_to_f64(whole) * 100.0
    }
}

/// Which labelled set a probe came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Derived from a registered original; expected to match
    Modified,
    /// Unrelated content; expected to be rejected
    Random,
}

impl ProbeKind {
    #[must_use]
    pub fn expects_match(self) -> bool {
        matches!(self, Self::Modified)
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modified => write!(f, "modified"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// Outcome of one labelled probe
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub file_name: String,
    pub kind: ProbeKind,
    pub predicted_match: bool,
    pub confidence: u32,
    pub best_match: Option<String>,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Average and maximum score of one rule across every probe with evidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleStats {
    pub average: f64,
    pub max: u32,
    pub max_score: u32,
}

/// Statistics and report text of a labelled batch run
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub results: Vec<ProbeResult>,
    pub elapsed_secs: f64,
    #[serde(skip)]
    pub report: String,
}

impl EvaluationSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.results.iter().filter(|r| r.is_correct).count()
    }

    /// `(correct, total)` for one probe kind
    #[must_use]
    pub fn counts(&self, kind: ProbeKind) -> (usize, usize) {
        let of_kind = self.results.iter().filter(|r| r.kind == kind);
        let total = of_kind.clone().count();
        let correct = of_kind.filter(|r| r.is_correct).count();
        (correct, total)
    }

    #[must_use]
    pub fn overall_accuracy(&self) -> f64 {
        percent(self.correct(), self.total())
    }

    #[must_use]
    pub fn accuracy(&self, kind: ProbeKind) -> f64 {
        let (correct, total) = self.counts(kind);
        percent(correct, total)
    }

    /// Share of random probes wrongly reported as matches
    #[must_use]
    pub fn false_positive_rate(&self) -> f64 {
        let (correct, total) = self.counts(ProbeKind::Random);
        percent(total - correct, total)
    }

    /// `None` when no probe produced evidence
    #[must_use]
    pub fn rule_stats(&self, kind: RuleKind) -> Option<RuleStats> {
        let scores: Vec<u32> = self
            .results
            .iter()
            .filter_map(|r| r.evidence.as_ref())
            .map(|e| match kind {
                RuleKind::Metadata => e.metadata.score,
                RuleKind::FuzzyHash => e.fuzzy_hash.score,
                RuleKind::TemplateMatching => e.template.score,
            })
            .collect();

        let max = *scores.iter().max()?;
        let sum: u32 = scores.iter().sum();
        Some(RuleStats {
            average: f64::from(sum) / count_to_f64(scores.len()),
            max,
            max_score: kind.max_score(),
        })
    }
}

/// Run every labelled probe through the matcher.
///
/// A probe that cannot be matched is recorded as incorrect with an `ERROR:`
/// report entry; it never stops the run.
#[must_use]
pub fn evaluate(matcher: &Matcher<'_>, modified: &[PathBuf], random: &[PathBuf]) -> EvaluationSummary {
    let start = Instant::now();
    let mut report = String::new();
    let _ = writeln!(report, "{REPORT_TITLE}");
    let _ = writeln!(report, "{}\n", "=".repeat(30));

    let probes = modified
        .iter()
        .map(|p| (p, ProbeKind::Modified))
        .chain(random.iter().map(|p| (p, ProbeKind::Random)));

    let total = modified.len() + random.len();
    let mut results = Vec::with_capacity(total);

    for (i, (path, kind)) in probes.enumerate() {
        let file_name = display_name(path);
        info!("Processing {}/{total}: {file_name}", i + 1);

        let result = match matcher.find_best_match(path) {
            Ok(outcome) => {
                let _ = writeln!(report, "{}", report::render(&outcome));
                let predicted_match = outcome.is_match();
                ProbeResult {
                    file_name,
                    kind,
                    predicted_match,
                    confidence: outcome.confidence,
                    best_match: outcome.best_match,
                    is_correct: predicted_match == kind.expects_match(),
                    evidence: outcome.evidence,
                    error: outcome.error,
                }
            }
            Err(e) => {
                warn!("{file_name}: {e}");
                let _ = writeln!(report, "Processing: {file_name}\nERROR: {e}\n");
                ProbeResult {
                    file_name,
                    kind,
                    predicted_match: false,
                    confidence: 0,
                    best_match: None,
                    is_correct: false,
                    evidence: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }

    EvaluationSummary {
        results,
        elapsed_secs: start.elapsed().as_secs_f64(),
        report,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

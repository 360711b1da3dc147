use serde::Serialize;
use std::fmt::Display;

use crate::core::types::{RuleKind, MAX_TOTAL_SCORE};

/// Score and justification produced by one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub score: u32,
    pub max_score: u32,
    pub reason: String,
}

impl RuleOutcome {
    /// Build an outcome, clamping `score` to the rule's budget
    #[must_use]
    pub fn new(kind: RuleKind, score: u32, reason: impl Into<String>) -> Self {
        let max_score = kind.max_score();
        Self {
            score: score.min(max_score),
            max_score,
            reason: reason.into(),
        }
    }

    /// Zero-point outcome for a rule whose collaborator failed
    #[must_use]
    pub fn error(kind: RuleKind, error: &impl Display) -> Self {
        Self::new(kind, 0, format!("Error: {error}"))
    }
}

/// Explanation of one probe-vs-reference comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    /// Name of the reference the probe was compared against
    pub reference: String,

    pub metadata: RuleOutcome,
    pub fuzzy_hash: RuleOutcome,
    pub template: RuleOutcome,

    /// Sum of the three rule scores, never above 100
    pub total_score: u32,

    pub is_match: bool,
}

impl Evidence {
    /// Sum the rule outcomes and apply the acceptance threshold
    #[must_use]
    pub fn aggregate(
        reference: impl Into<String>,
        metadata: RuleOutcome,
        fuzzy_hash: RuleOutcome,
        template: RuleOutcome,
        match_threshold: u32,
    ) -> Self {
        let total_score =
            (metadata.score + fuzzy_hash.score + template.score).min(MAX_TOTAL_SCORE);

        Self {
            reference: reference.into(),
            metadata,
            fuzzy_hash,
            template,
            total_score,
            is_match: total_score >= match_threshold,
        }
    }

    /// The three outcomes in report order
    #[must_use]
    pub fn rules(&self) -> [(RuleKind, &RuleOutcome); 3] {
        [
            (RuleKind::Metadata, &self.metadata),
            (RuleKind::FuzzyHash, &self.fuzzy_hash),
            (RuleKind::TemplateMatching, &self.template),
        ]
    }
}

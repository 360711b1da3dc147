//! Plain-text rendering of match outcomes.

use std::fmt::Write;

use crate::core::types::{RuleKind, MAX_TOTAL_SCORE};
use crate::matching::engine::MatchOutcome;
use crate::matching::scoring::Evidence;

const RULE_ORDER: [RuleKind; 3] = [
    RuleKind::Metadata,
    RuleKind::FuzzyHash,
    RuleKind::TemplateMatching,
];

/// One line per rule, as `Rule N (<Name>): <reason> -> <score>/<max> points`
#[must_use]
pub fn rule_lines(evidence: &Evidence) -> Vec<String> {
    evidence
        .rules()
        .iter()
        .map(|(kind, outcome)| {
            format!(
                "Rule {} ({kind}): {} -> {}/{} points",
                kind.number(),
                outcome.reason,
                outcome.score,
                outcome.max_score
            )
        })
        .collect()
}

/// The verdict line for a piece of evidence
#[must_use]
pub fn final_line(evidence: &Evidence) -> String {
    if evidence.is_match {
        format!(
            "Final Score: {}/{MAX_TOTAL_SCORE} -> MATCH to {}",
            evidence.total_score, evidence.reference
        )
    } else {
        format!(
            "Final Score: {}/{MAX_TOTAL_SCORE} -> REJECTED",
            evidence.total_score
        )
    }
}

/// Render a probe's outcome as a report block ending in a newline
#[must_use]
pub fn render(outcome: &MatchOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Processing: {}", outcome.probe);

    match &outcome.evidence {
        Some(evidence) => {
            for line in rule_lines(evidence) {
                let _ = writeln!(out, "{line}");
            }
            let _ = writeln!(out, "{}", final_line(evidence));
        }
        None => {
            for kind in RULE_ORDER {
                let _ = writeln!(
                    out,
                    "Rule {} ({kind}): ERROR -> 0/{} points",
                    kind.number(),
                    kind.max_score()
                );
            }
            let _ = writeln!(out, "Final Score: 0/{MAX_TOTAL_SCORE} -> REJECTED");
        }
    }

    out
}

//! Byte-level similarity of the two files' fuzzy digests.

use crate::core::signature::Signature;
use crate::core::types::RuleKind;
use crate::matching::scoring::RuleOutcome;
use crate::similarity::fuzzy;

fn points(similarity: u32) -> (u32, &'static str) {
    if similarity >= 80 {
        (10, "STRONG MATCH")
    } else if similarity >= 60 {
        (8, "MATCH")
    } else {
        (0, "NO MATCH")
    }
}

/// Compare fuzzy digests. A digest that cannot be compared scores 0 here
/// instead of failing the comparison.
#[must_use]
pub fn evaluate(probe: &Signature, reference: &Signature) -> RuleOutcome {
    let (Some(a), Some(b)) = (&probe.fuzzy_digest, &reference.fuzzy_digest) else {
        return RuleOutcome::new(RuleKind::FuzzyHash, 0, "NO MATCH - fuzzy hash unavailable");
    };

    match fuzzy::compare(a, b) {
        Ok(similarity) => {
            let (score, status) = points(similarity);
            RuleOutcome::new(
                RuleKind::FuzzyHash,
                score,
                format!("{status} - fuzzy hash similarity {similarity}%"),
            )
        }
        Err(e) => RuleOutcome::new(
            RuleKind::FuzzyHash,
            0,
            format!("NO MATCH - fuzzy hash error: {e}"),
        ),
    }
}

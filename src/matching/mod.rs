//! Derivative matching: rule evaluation, aggregation and best-match selection.
//!
//! - [`Matcher`]: compares a probe against every registered reference
//! - [`Evidence`]: per-rule scores and the verdict for one comparison
//! - [`rules`]: the metadata, fuzzy-hash and template-matching rules
//! - [`report`]: plain-text rendering of outcomes
//!
//! ## Scoring
//!
//! Each rule scores independently within its own budget and the three scores
//! are summed. A comparison is a match when the sum reaches the threshold
//! (60 of 100 by default). Template matching carries most of the weight
//! because it survives cropping and recompression; metadata and fuzzy
//! hashing mostly add confidence to near-identical copies.
//!
//! ## Example
//!
//! ```rust,no_run
//! use derivscan::{Matcher, Registry};
//! use std::path::Path;
//!
//! let mut registry = Registry::new();
//! registry.register(Path::new("originals")).unwrap();
//!
//! let matcher = Matcher::new(&registry);
//! let outcome = matcher.find_best_match(Path::new("suspect.jpg")).unwrap();
//!
//! println!("{}", derivscan::matching::report::render(&outcome));
//! ```

pub mod engine;
pub mod report;
pub mod rules;
pub mod scoring;

pub use engine::{MatchError, MatchOutcome, Matcher, MatchingConfig};
pub use scoring::{Evidence, RuleOutcome};

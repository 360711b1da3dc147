//! # derivscan
//!
//! A library for deciding whether an image is a derivative of a known original.
//!
//! Images get cropped, recompressed and re-encoded as they move between
//! systems, so byte-exact hashes stop matching almost immediately. `derivscan`
//! registers a set of originals and scores each probe image against all of
//! them with three independent rules, then reports the best candidate along
//! with a per-rule explanation.
//!
//! ## Rules
//!
//! - **Metadata** (30 points): byte size ratio, area and aspect similarity, color mode
//! - **Fuzzy hash** (10 points): context-triggered piecewise hash of the raw bytes
//! - **Template matching** (60 points): normalized cross-correlation of patches
//!   sampled from the corners and center of the original
//!
//! A probe matches when its best total reaches 60 of 100.
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
//! match &outcome.best_match {
//!     Some(name) if outcome.is_match() => println!("derived from {name} ({}/100)", outcome.confidence),
//!     _ => println!("no registered original ({}/100)", outcome.confidence),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Signature model and shared types
//! - [`extraction`]: Turning image files into signatures
//! - [`similarity`]: Fuzzy hashing and template correlation
//! - [`registry`]: Registered reference signatures
//! - [`matching`]: Rules, aggregation and best-match selection
//! - [`evaluation`]: Batch accuracy runs over labelled folders
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod evaluation;
pub mod extraction;
pub mod matching;
pub mod registry;
pub mod similarity;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use core::signature::Signature;
pub use core::types::*;
pub use extraction::compute_signature;
pub use matching::engine::{MatchError, MatchOutcome, Matcher, MatchingConfig};
pub use matching::scoring::{Evidence, RuleOutcome};
pub use registry::store::{Registry, RegistryError};

//! Similarity primitives used by the scoring rules.
//!
//! - [`fuzzy`]: context-triggered piecewise hashing of raw file bytes
//! - [`correlation`]: normalized cross-correlation of RGB patches

pub mod correlation;
pub mod fuzzy;

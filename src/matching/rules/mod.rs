//! The three scoring rules.
//!
//! | Rule | Budget | Signal |
//! |------|--------|--------|
//! | [`metadata`] | 30 | byte size, area and aspect, color mode |
//! | [`fuzzy_hash`] | 10 | piecewise hash of the raw bytes |
//! | [`template`] | 60 | correlation of anchored reference patches |
//!
//! Rules are independent: none reads another's result. Metadata and fuzzy
//! hash absorb every failure themselves; template matching reports a probe
//! decode failure, which the matcher turns into a zero-point outcome.

pub mod fuzzy_hash;
pub mod metadata;
pub mod template;

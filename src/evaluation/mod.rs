//! Batch evaluation over labelled probe sets.
//!
//! Modified probes are expected to match a registered original and random
//! probes to be rejected. [`harness::evaluate`] runs both sets and collects
//! accuracy, false-positive rate and per-rule score statistics along with
//! the full text report.

pub mod harness;

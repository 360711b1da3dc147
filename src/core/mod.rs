//! Core data types for derivative detection.
//!
//! - [`Signature`]: the comparable fingerprint of one image
//! - [`FileFacts`], [`RasterFacts`]: file-level and raster-level field groups
//! - [`TemplateSet`], [`Template`]: anchored pixel patches used for correlation
//! - [`ColorMode`], [`Anchor`], [`RuleKind`]: classification types
//!
//! ## Partial signatures
//!
//! Extraction never fails outright. Each field group is optional and rules
//! treat an absent group as "no evidence" rather than an error:
//!
//! | Group        | Absent when                        | Rules that need it |
//! |--------------|------------------------------------|--------------------|
//! | `file`       | the path cannot be read            | metadata (size)    |
//! | `raster`     | the bytes do not decode            | metadata (dims, mode) |
//! | `fuzzy_digest` | the path cannot be read          | fuzzy hash         |
//! | `templates`  | decode failed or image is < 4 px   | template matching  |

pub mod signature;
pub mod types;

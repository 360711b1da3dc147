//! Registered reference images.
//!
//! A [`store::Registry`] is filled once, either by scanning a folder of
//! originals or by loading a JSON snapshot, and is read-only while matching.
//!
//! ## Example
//!
//! ```rust,no_run
//! use derivscan::Registry;
//! use std::path::Path;
//!
//! let mut registry = Registry::new();
//! let added = registry.register(Path::new("originals")).unwrap();
//! println!("{added} references");
//!
//! // Reuse the registration pass later
//! registry.save(Path::new("registry.json")).unwrap();
//! let restored = Registry::load(Path::new("registry.json")).unwrap();
//! ```

pub mod store;

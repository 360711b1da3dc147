//! Command-line interface for derivscan.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **identify**: Find the registered original each probe image derives from
//! - **compare**: Show the full evidence for one probe/reference pair
//! - **evaluate**: Score labelled modified and random sets and write a report
//! - **registry**: List, show, or export a registration pass
//!
//! ## Usage
//!
//! ```text
//! # Identify probes against a folder of originals
//! derivscan identify --originals originals/ suspect1.jpg suspect2.png
//!
//! # Register once, reuse the snapshot
//! derivscan registry export --originals originals/ registry.json
//! derivscan identify --registry registry.json suspect1.jpg
//!
//! # JSON output for scripting
//! derivscan identify --originals originals/ suspect1.jpg --format json
//!
//! # Batch evaluation
//! derivscan evaluate --originals originals --modified modified --random random
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::registry::store::Registry;

pub mod compare;
pub mod evaluate;
pub mod identify;
pub mod registry;

#[derive(Parser)]
#[command(name = "derivscan")]
#[command(version)]
#[command(about = "Detect cropped and re-encoded derivatives of registered images")]
#[command(
    long_about = "derivscan decides whether probe images are derivatives (cropped, recompressed, re-encoded) of a set of registered originals.\n\nEach probe is compared against every original with three independent rules:\n- Metadata: byte size, dimensions and color mode (30 points)\n- Fuzzy hash: piecewise hash similarity of the raw bytes (10 points)\n- Template matching: correlation of anchored patches (60 points)\n\nA probe matches when the best total reaches 60 of 100."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify which registered original each probe derives from
    Identify(identify::IdentifyArgs),

    /// Compare one probe against one reference image
    Compare(compare::CompareArgs),

    /// Evaluate detection accuracy on labelled folders
    Evaluate(evaluate::EvaluateArgs),

    /// Inspect or export registered references
    Registry(registry::RegistryArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where reference signatures come from
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RegistrySource {
    /// Folder of original images to register
    #[arg(long)]
    pub originals: Option<PathBuf>,

    /// Registry snapshot written by `registry export`
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

impl RegistrySource {
    /// Register the originals folder or load the snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the folder is missing or the snapshot is unreadable.
    pub fn load(&self, verbose: bool) -> anyhow::Result<Registry> {
        let registry = match (&self.originals, &self.registry) {
            (Some(folder), _) => {
                let mut registry = Registry::new();
                registry.register(folder)?;
                registry
            }
            (None, Some(path)) => Registry::load(path)?,
            (None, None) => anyhow::bail!("Either --originals or --registry is required"),
        };

        if verbose {
            eprintln!("Loaded {} reference images", registry.len());
        }
        Ok(registry)
    }
}

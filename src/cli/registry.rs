use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::{OutputFormat, RegistrySource};
use crate::core::signature::Signature;
use crate::registry::store::Registry;

#[derive(Args)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommands,
}

#[derive(Subcommand)]
pub enum RegistryCommands {
    /// List all registered references
    List {
        #[command(flatten)]
        source: RegistrySource,
    },

    /// Show details of a single reference
    Show {
        /// Reference name (file name of the original)
        #[arg(required = true)]
        name: String,

        #[command(flatten)]
        source: RegistrySource,

        /// Show all EXIF tags
        #[arg(long)]
        all_tags: bool,
    },

    /// Save the registration pass as a JSON snapshot
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        #[command(flatten)]
        source: RegistrySource,
    },
}

/// Execute registry subcommand
///
/// # Errors
///
/// Returns an error if the registry cannot be built, the name is unknown,
/// or the snapshot cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RegistryArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        RegistryCommands::List { source } => {
            let registry = source.load(verbose)?;
            match format {
                OutputFormat::Text => print_text_list(&registry),
                OutputFormat::Json => print_json_list(&registry)?,
                OutputFormat::Tsv => print_tsv_list(&registry),
            }
        }
        RegistryCommands::Show {
            name,
            source,
            all_tags,
        } => {
            let registry = source.load(verbose)?;
            let signature = registry
                .get(&name)
                .ok_or_else(|| anyhow::anyhow!("Reference '{name}' not found in registry"))?;
            match format {
                OutputFormat::Text => print_text_details(&name, signature, all_tags),
                OutputFormat::Json | OutputFormat::Tsv => print_json_details(&name, signature)?,
            }
        }
        RegistryCommands::Export { output, source } => {
            let registry = source.load(verbose)?;
            registry.save(&output)?;
            println!(
                "Exported {} references to {}",
                registry.len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn dimensions(sig: &Signature) -> String {
    sig.raster
        .as_ref()
        .map_or_else(|| "-".to_string(), |r| format!("{}x{}", r.width, r.height))
}

fn color_mode(sig: &Signature) -> String {
    sig.raster
        .as_ref()
        .map_or_else(|| "-".to_string(), |r| r.color_mode.to_string())
}

fn print_text_list(registry: &Registry) {
    println!(
        "{:<32} {:>11} {:>5} {:>10} {:>9}",
        "NAME", "DIMENSIONS", "MODE", "BYTES", "TEMPLATES"
    );
    println!("{}", "-".repeat(71));

    for (name, sig) in registry.iter() {
        println!(
            "{:<32} {:>11} {:>5} {:>10} {:>9}",
            name,
            dimensions(sig),
            color_mode(sig),
            sig.file.as_ref().map_or(0, |f| f.size),
            sig.template_count()
        );
    }

    println!("\nTotal: {} references", registry.len());
}

fn list_entry(name: &str, sig: &Signature) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "path": sig.path.display().to_string(),
        "width": sig.raster.as_ref().map(|r| r.width),
        "height": sig.raster.as_ref().map(|r| r.height),
        "color_mode": sig.raster.as_ref().map(|r| r.color_mode.to_string()),
        "size": sig.file.as_ref().map(|f| f.size),
        "templates": sig.template_count(),
        "exif_tags": sig.exif.len(),
    })
}

fn print_json_list(registry: &Registry) -> anyhow::Result<()> {
    let list: Vec<serde_json::Value> = registry
        .iter()
        .map(|(name, sig)| list_entry(name, sig))
        .collect();
    println!("{}", serde_json::to_string_pretty(&list)?);
    Ok(())
}

fn print_tsv_list(registry: &Registry) {
    println!("name\tdimensions\tmode\tbytes\ttemplates");
    for (name, sig) in registry.iter() {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            name,
            dimensions(sig),
            color_mode(sig),
            sig.file.as_ref().map_or(0, |f| f.size),
            sig.template_count()
        );
    }
}

fn print_text_details(name: &str, sig: &Signature, all_tags: bool) {
    println!("Reference: {name}");
    println!("{}", "=".repeat(60));
    println!("Path: {}", sig.path.display());

    if let Some(file) = &sig.file {
        println!("Size: {} bytes", file.size);
        println!("MD5: {}", file.md5);
        if let Some(modified) = file.modified {
            println!("Modified: {}", modified.to_rfc3339());
        }
    }

    if let Some(raster) = &sig.raster {
        println!("Dimensions: {}x{}", raster.width, raster.height);
        println!("Mode: {}", raster.color_mode);
        println!(
            "Intensity: mean {:.2}, std {:.2}",
            raster.mean_intensity, raster.std_intensity
        );
    }

    if let Some(digest) = &sig.fuzzy_digest {
        println!("Fuzzy digest: {digest}");
    }

    match &sig.templates {
        Some(set) => {
            println!("\nTemplates ({}x{} px):", set.size, set.size);
            for template in &set.templates {
                println!(
                    "  {:<13} at ({}, {})",
                    template.anchor.to_string(),
                    template.x,
                    template.y
                );
            }
        }
        None => println!("\nTemplates: none (image too small or not decodable)"),
    }

    if !sig.exif.is_empty() {
        println!("\nEXIF tags: {}", sig.exif.len());
        let shown = if all_tags { sig.exif.len() } else { 10 };
        for (tag, value) in sig.exif.iter().take(shown) {
            println!("  {tag}: {value}");
        }
        if sig.exif.len() > shown {
            println!("  ... and {} more (use --all-tags)", sig.exif.len() - shown);
        }
    }
}

fn print_json_details(name: &str, sig: &Signature) -> anyhow::Result<()> {
    let templates: Vec<serde_json::Value> = sig
        .templates
        .iter()
        .flat_map(|set| {
            set.templates.iter().map(move |t| {
                serde_json::json!({
                    "anchor": t.anchor,
                    "x": t.x,
                    "y": t.y,
                    "size": set.size,
                })
            })
        })
        .collect();

    let output = serde_json::json!({
        "name": name,
        "path": sig.path.display().to_string(),
        "file": sig.file,
        "raster": sig.raster,
        "fuzzy_digest": sig.fuzzy_digest,
        "templates": templates,
        "exif": sig.exif,
        "error": sig.error,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::signature::Signature;
use crate::extraction::compute_signature;
use crate::matching::engine::{Matcher, MatchingConfig};
use crate::matching::report;
use crate::matching::scoring::Evidence;
use crate::registry::store::Registry;

#[derive(Args)]
pub struct CompareArgs {
    /// Probe image
    #[arg(required = true)]
    pub probe: PathBuf,

    /// Reference image to compare against
    #[arg(required = true)]
    pub reference: PathBuf,

    /// Minimum total score (0-100) for the pair to count as a match
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(0..=100))]
    pub threshold: u32,
}

/// Execute compare subcommand
///
/// # Errors
///
/// Returns an error if either file cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let probe = read_signature(&args.probe)?;
    let reference = read_signature(&args.reference)?;

    if verbose {
        for sig in [&probe, &reference] {
            if let Some(error) = &sig.error {
                eprintln!("Warning: {}: {error}", sig.file_name);
            }
        }
    }

    let registry = Registry::new();
    let config = MatchingConfig {
        match_threshold: args.threshold,
    };
    let evidence =
        Matcher::with_config(&registry, config).compare(&probe, &reference, &reference.file_name);

    match format {
        OutputFormat::Text => print_text_comparison(&probe, &reference, &evidence),
        OutputFormat::Json => print_json_comparison(&probe, &reference, &evidence)?,
        OutputFormat::Tsv => print_tsv_comparison(&evidence),
    }

    Ok(())
}

fn read_signature(path: &std::path::Path) -> anyhow::Result<Signature> {
    let signature = compute_signature(path);
    if signature.is_unreadable() {
        anyhow::bail!(
            "Cannot read {}: {}",
            path.display(),
            signature.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(signature)
}

fn describe(label: &str, sig: &Signature) {
    println!("\n{label}: {}", sig.path.display());
    if let Some(file) = &sig.file {
        println!("  Size: {} bytes", file.size);
    }
    match &sig.raster {
        Some(raster) => {
            println!("  Dimensions: {}x{}", raster.width, raster.height);
            println!("  Mode: {}", raster.color_mode);
        }
        None => println!("  Dimensions: unavailable"),
    }
    println!("  Templates: {}", sig.template_count());
}

fn print_text_comparison(probe: &Signature, reference: &Signature, evidence: &Evidence) {
    println!("Comparison Results");
    println!("{}", "=".repeat(60));

    describe("Probe", probe);
    describe("Reference", reference);

    println!();
    for line in report::rule_lines(evidence) {
        println!("{line}");
    }
    println!("{}", report::final_line(evidence));
}

fn signature_summary(sig: &Signature) -> serde_json::Value {
    serde_json::json!({
        "path": sig.path.display().to_string(),
        "size": sig.file.as_ref().map(|f| f.size),
        "width": sig.raster.as_ref().map(|r| r.width),
        "height": sig.raster.as_ref().map(|r| r.height),
        "color_mode": sig.raster.as_ref().map(|r| r.color_mode.to_string()),
        "templates": sig.template_count(),
        "error": sig.error,
    })
}

fn print_json_comparison(
    probe: &Signature,
    reference: &Signature,
    evidence: &Evidence,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "probe": signature_summary(probe),
        "reference": signature_summary(reference),
        "evidence": evidence,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_comparison(evidence: &Evidence) {
    println!("reference\tmetadata\tfuzzy_hash\ttemplate\ttotal\tis_match");
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        evidence.reference,
        evidence.metadata.score,
        evidence.fuzzy_hash.score,
        evidence.template.score,
        evidence.total_score,
        evidence.is_match,
    );
}

use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::types::RuleKind;
use crate::evaluation::harness::{self, EvaluationSummary, ProbeKind};
use crate::extraction::list_images;
use crate::matching::engine::{Matcher, MatchingConfig};
use crate::registry::store::Registry;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Folder of original images to register
    #[arg(long, default_value = "originals")]
    pub originals: PathBuf,

    /// Folder of derivatives that should match an original
    #[arg(long, default_value = "modified")]
    pub modified: PathBuf,

    /// Folder of unrelated images that should be rejected
    #[arg(long, default_value = "random")]
    pub random: PathBuf,

    /// Report file to write
    #[arg(short, long, default_value = "results.txt")]
    pub output: PathBuf,

    /// Minimum total score (0-100) for a probe to count as a match
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(0..=100))]
    pub threshold: u32,
}

/// Execute evaluate subcommand
///
/// # Errors
///
/// Returns an error if any input folder is missing or the report cannot be
/// written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: EvaluateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let missing: Vec<String> = [&args.originals, &args.modified, &args.random]
        .into_iter()
        .filter(|folder| !folder.is_dir())
        .map(|folder| folder.display().to_string())
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("Missing folders: {}", missing.join(", "));
    }

    let mut registry = Registry::new();
    let registered = registry.register(&args.originals)?;
    if verbose {
        eprintln!("Registered {registered} reference images");
    }

    let modified = list_images(&args.modified)?;
    let random = list_images(&args.random)?;
    if verbose {
        eprintln!(
            "Testing on {} images ({} modified, {} random)",
            modified.len() + random.len(),
            modified.len(),
            random.len()
        );
    }

    let config = MatchingConfig {
        match_threshold: args.threshold,
    };
    let matcher = Matcher::with_config(&registry, config);
    let summary = harness::evaluate(&matcher, &modified, &random);

    std::fs::write(&args.output, &summary.report)?;

    match format {
        OutputFormat::Text => print_text_summary(&summary, &args.output),
        OutputFormat::Json => print_json_summary(&summary, &args.output)?,
        OutputFormat::Tsv => print_tsv_results(&summary),
    }

    Ok(())
}

fn print_text_summary(summary: &EvaluationSummary, output: &Path) {
    let (modified_correct, modified_total) = summary.counts(ProbeKind::Modified);
    let (random_correct, random_total) = summary.counts(ProbeKind::Random);

    println!("{}", "-".repeat(45));
    println!("{}RESULTS SUMMARY", " ".repeat(17));
    println!("{}", "-".repeat(45));
    println!("Total images processed: {}", summary.total());
    println!("Processing time: {:.2} seconds", summary.elapsed_secs);
    println!();
    println!(
        "Overall accuracy: {:.1}% ({}/{})",
        summary.overall_accuracy(),
        summary.correct(),
        summary.total()
    );
    println!(
        "Modified images accuracy: {:.1}% ({modified_correct}/{modified_total})",
        summary.accuracy(ProbeKind::Modified)
    );
    println!(
        "Random images accuracy: {:.1}% ({random_correct}/{random_total})",
        summary.accuracy(ProbeKind::Random)
    );
    println!("False positive rate: {:.1}%", summary.false_positive_rate());

    let rules = [
        ("Metadata Rule", RuleKind::Metadata),
        ("Fuzzy Hash Rule", RuleKind::FuzzyHash),
        ("Template Matching Rule", RuleKind::TemplateMatching),
    ];
    let mut printed_header = false;
    for (label, kind) in rules {
        if let Some(stats) = summary.rule_stats(kind) {
            if !printed_header {
                println!();
                printed_header = true;
            }
            println!(
                "{label} - Avg: {:.1}/{}, Max: {}/{}",
                stats.average, stats.max_score, stats.max, stats.max_score
            );
        }
    }

    println!("\nResults written to: {}", output.display());
}

fn print_json_summary(summary: &EvaluationSummary, output: &Path) -> anyhow::Result<()> {
    let (modified_correct, modified_total) = summary.counts(ProbeKind::Modified);
    let (random_correct, random_total) = summary.counts(ProbeKind::Random);

    let json = serde_json::json!({
        "total": summary.total(),
        "correct": summary.correct(),
        "elapsed_secs": summary.elapsed_secs,
        "overall_accuracy": summary.overall_accuracy(),
        "modified": {
            "correct": modified_correct,
            "total": modified_total,
            "accuracy": summary.accuracy(ProbeKind::Modified),
        },
        "random": {
            "correct": random_correct,
            "total": random_total,
            "accuracy": summary.accuracy(ProbeKind::Random),
        },
        "false_positive_rate": summary.false_positive_rate(),
        "rules": {
            "metadata": summary.rule_stats(RuleKind::Metadata),
            "fuzzy_hash": summary.rule_stats(RuleKind::FuzzyHash),
            "template": summary.rule_stats(RuleKind::TemplateMatching),
        },
        "results": summary.results,
        "report": output.display().to_string(),
    });

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_tsv_results(summary: &EvaluationSummary) {
    println!("file\tkind\tpredicted_match\tconfidence\tbest_match\tis_correct");
    for result in &summary.results {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            result.file_name,
            result.kind,
            result.predicted_match,
            result.confidence,
            result.best_match.as_deref().unwrap_or("-"),
            result.is_correct,
        );
    }
}

use std::path::PathBuf;

use clap::Args;

use crate::cli::{OutputFormat, RegistrySource};
use crate::matching::engine::{MatchOutcome, Matcher, MatchingConfig};
use crate::matching::report;

#[derive(Args)]
pub struct IdentifyArgs {
    /// Probe images to identify
    #[arg(required = true)]
    pub probes: Vec<PathBuf>,

    #[command(flatten)]
    pub source: RegistrySource,

    /// Minimum total score (0-100) for a probe to count as a match
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(0..=100))]
    pub threshold: u32,
}

/// Execute identify subcommand
///
/// # Errors
///
/// Returns an error if the registry cannot be built or is empty.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: IdentifyArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = args.source.load(verbose)?;
    let config = MatchingConfig {
        match_threshold: args.threshold,
    };
    let matcher = Matcher::with_config(&registry, config);

    let mut outcomes = Vec::with_capacity(args.probes.len());
    for probe in &args.probes {
        if verbose {
            eprintln!("Matching {}", probe.display());
        }
        outcomes.push(matcher.find_best_match(probe)?);
    }

    match format {
        OutputFormat::Text => print_text_results(&outcomes),
        OutputFormat::Json => print_json_results(&outcomes)?,
        OutputFormat::Tsv => print_tsv_results(&outcomes),
    }

    Ok(())
}

fn print_text_results(outcomes: &[MatchOutcome]) {
    for (i, outcome) in outcomes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", report::render(outcome));
        if let Some(error) = &outcome.error {
            println!("  Note: {error}");
        }
    }
}

fn print_json_results(outcomes: &[MatchOutcome]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcomes)?);
    Ok(())
}

fn print_tsv_results(outcomes: &[MatchOutcome]) {
    println!("probe\tbest_match\tconfidence\tis_match\tmetadata\tfuzzy_hash\ttemplate");
    for outcome in outcomes {
        let (metadata, fuzzy_hash, template) = outcome.evidence.as_ref().map_or((0, 0, 0), |e| {
            (e.metadata.score, e.fuzzy_hash.score, e.template.score)
        });
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            outcome.probe,
            outcome.best_match.as_deref().unwrap_or("-"),
            outcome.confidence,
            outcome.is_match(),
            metadata,
            fuzzy_hash,
            template,
        );
    }
}

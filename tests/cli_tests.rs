//! Command-line behavior of the `derivscan` binary.

mod common;

use assert_cmd::Command;
use common::{noise_image, write_image, Corpus};
use predicates::prelude::*;
use tempfile::TempDir;

fn derivscan() -> Command {
    Command::cargo_bin("derivscan").unwrap()
}

#[test]
fn test_identify_reports_match() {
    let corpus = Corpus::build();

    derivscan()
        .arg("identify")
        .arg("--originals")
        .arg(&corpus.originals)
        .arg(corpus.modified.join("gradient_crop.png"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing: gradient_crop.png"))
        .stdout(predicate::str::contains("Rule 1 (Metadata): "))
        .stdout(predicate::str::contains("Rule 2 (Fuzzy Hash): "))
        .stdout(predicate::str::contains("Rule 3 (Template): EXACT MATCH"))
        .stdout(predicate::str::contains("-> MATCH to gradient.png"));
}

#[test]
fn test_identify_rejects_unrelated() {
    let corpus = Corpus::build();

    derivscan()
        .arg("identify")
        .arg("--originals")
        .arg(&corpus.originals)
        .arg(corpus.random.join("unrelated_a.png"))
        .assert()
        .success()
        .stdout(predicate::str::contains("-> REJECTED"));
}

#[test]
fn test_identify_json_output() {
    let corpus = Corpus::build();

    let output = derivscan()
        .args(["--format", "json", "identify", "--originals"])
        .arg(&corpus.originals)
        .arg(corpus.modified.join("noise_reencoded.bmp"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["best_match"], "noise.png");
    assert_eq!(json[0]["evidence"]["is_match"], true);
    assert_eq!(json[0]["evidence"]["template"]["max_score"], 60);
}

#[test]
fn test_identify_requires_a_source() {
    derivscan()
        .args(["identify", "probe.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--originals").or(predicate::str::contains("--registry")));
}

#[test]
fn test_identify_missing_originals_folder() {
    derivscan()
        .args(["identify", "--originals", "/nonexistent/originals", "probe.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Folder not found"));
}

#[test]
fn test_identify_empty_originals_folder() {
    let dir = TempDir::new().unwrap();

    derivscan()
        .arg("identify")
        .arg("--originals")
        .arg(dir.path())
        .arg("probe.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No reference images registered"));
}

#[test]
fn test_compare_pair() {
    let dir = TempDir::new().unwrap();
    let image = noise_image(64, 48, 2);
    let a = write_image(dir.path(), "a.png", &image);
    let b = write_image(dir.path(), "b.bmp", &image);

    derivscan()
        .arg("compare")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("Comparison Results"))
        .stdout(predicate::str::contains("Rule 3 (Template): EXACT MATCH"))
        .stdout(predicate::str::contains("-> MATCH to b.bmp"));
}

#[test]
fn test_compare_tsv_output() {
    let dir = TempDir::new().unwrap();
    let a = write_image(dir.path(), "a.png", &noise_image(64, 48, 3));

    derivscan()
        .args(["--format", "tsv", "compare"])
        .arg(&a)
        .arg(&a)
        .assert()
        .success()
        .stdout(predicate::str::contains("reference\tmetadata\tfuzzy_hash\ttemplate\ttotal\tis_match"))
        .stdout(predicate::str::contains("a.png\t30\t10\t60\t100\ttrue"));
}

#[test]
fn test_compare_missing_file() {
    let dir = TempDir::new().unwrap();
    let a = write_image(dir.path(), "a.png", &noise_image(16, 16, 4));

    derivscan()
        .arg("compare")
        .arg(&a)
        .arg(dir.path().join("missing.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn test_evaluate_writes_report() {
    let corpus = Corpus::build();
    let report = corpus.root.path().join("results.txt");

    derivscan()
        .arg("evaluate")
        .arg("--originals")
        .arg(&corpus.originals)
        .arg("--modified")
        .arg(&corpus.modified)
        .arg("--random")
        .arg(&corpus.random)
        .arg("--output")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("RESULTS SUMMARY"))
        .stdout(predicate::str::contains("Overall accuracy: 100.0% (4/4)"))
        .stdout(predicate::str::contains("False positive rate: 0.0%"))
        .stdout(predicate::str::contains("Template Matching Rule - Avg:"));

    let text = std::fs::read_to_string(&report).unwrap();
    assert!(text.starts_with(" Digital Forensics Results\n=============================="));
    assert!(text.contains("Processing: gradient_crop.png"));
    assert!(text.contains("MATCH to noise.png"));
}

#[test]
fn test_evaluate_reports_all_missing_folders() {
    let dir = TempDir::new().unwrap();
    let originals = dir.path().join("originals");
    std::fs::create_dir(&originals).unwrap();

    derivscan()
        .arg("evaluate")
        .arg("--originals")
        .arg(&originals)
        .arg("--modified")
        .arg(dir.path().join("modified"))
        .arg("--random")
        .arg(dir.path().join("random"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing folders:"))
        .stderr(predicate::str::contains("modified"))
        .stderr(predicate::str::contains("random"));
}

#[test]
fn test_registry_export_then_identify() {
    let corpus = Corpus::build();
    let snapshot = corpus.root.path().join("registry.json");

    derivscan()
        .args(["registry", "export"])
        .arg(&snapshot)
        .arg("--originals")
        .arg(&corpus.originals)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 references"));

    derivscan()
        .arg("identify")
        .arg("--registry")
        .arg(&snapshot)
        .arg(corpus.modified.join("gradient_crop.png"))
        .assert()
        .success()
        .stdout(predicate::str::contains("-> MATCH to gradient.png"));
}

#[test]
fn test_registry_list_and_show() {
    let corpus = Corpus::build();

    derivscan()
        .args(["registry", "list", "--originals"])
        .arg(&corpus.originals)
        .assert()
        .success()
        .stdout(predicate::str::contains("gradient.png"))
        .stdout(predicate::str::contains("160x120"))
        .stdout(predicate::str::contains("Total: 2 references"));

    derivscan()
        .args(["registry", "show", "noise.png", "--originals"])
        .arg(&corpus.originals)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dimensions: 96x64"))
        .stdout(predicate::str::contains("Templates (16x16 px)"));

    derivscan()
        .args(["registry", "show", "absent.png", "--originals"])
        .arg(&corpus.originals)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in registry"));
}

/// End-to-end tests of the rnapipe binary
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to write a config rooted at the temp dir
fn write_config(dir: &TempDir, samples: &str) -> PathBuf {
    let root = dir.path().display().to_string();
    let json = r#"{
        "samples": SAMPLES,
        "directories": {
            "fastq": { "work": "ROOT/fastq" },
            "salmon": { "work": "ROOT/salmon" },
            "alignment": { "scratch": "ROOT/aln" },
            "stringtie": { "naive": "ROOT/stringtie" }
        },
        "reference": { "salmon_quasi": "ROOT/ref/index", "gtf": "ROOT/ref/genes.gtf" },
        "salmon": { "mean": 200, "sd": 80, "validateMappings": true }
    }"#
    .replace("SAMPLES", samples)
    .replace("ROOT", &root);

    let path = dir.path().join("config.json");
    fs::write(&path, json).unwrap();
    path
}

fn rnapipe() -> Command {
    Command::cargo_bin("rnapipe").unwrap()
}

const TWO_SAMPLES: &str = r#"{ "brain": { "s1": "brain/s1" }, "liver": { "s2": "liver/s2" } }"#;

#[test]
fn targets_lists_one_quant_file_per_sample() {
    let tmpdir = TempDir::new().unwrap();
    let config = write_config(&tmpdir, TWO_SAMPLES);
    let salmon = tmpdir.path().join("salmon");

    rnapipe()
        .args(["-q", "targets", "-p", "salmon", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            salmon.join("brain_s1/quant.sf").display().to_string(),
        ))
        .stdout(predicate::str::contains(
            salmon.join("liver_s2/quant.sf").display().to_string(),
        ));
}

#[test]
fn duplicate_identifiers_fail() {
    let tmpdir = TempDir::new().unwrap();
    let config = write_config(&tmpdir, r#"{ "x_a": { "1": "p" }, "x": { "a_1": "q" } }"#);

    rnapipe()
        .args(["targets", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("duplicate sample identifier"));
}

#[test]
fn dry_run_creates_nothing() {
    let tmpdir = TempDir::new().unwrap();
    let config = write_config(&tmpdir, TWO_SAMPLES);
    fs::create_dir(tmpdir.path().join("stringtie")).unwrap();

    rnapipe()
        .args(["run", "-n", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("salmon quant"))
        .stdout(predicate::str::contains("stringtie "));

    assert!(!tmpdir.path().join("stringtie/brain_s1").exists());
    assert!(!tmpdir.path().join("salmon").exists());
}

#[test]
fn missing_reads_abort_before_running() {
    let tmpdir = TempDir::new().unwrap();
    let config = write_config(&tmpdir, TWO_SAMPLES);

    rnapipe()
        .args(["run", "-p", "salmon", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("s1_1.fastq.gz"));
}

#[test]
fn up_to_date_targets_run_nothing() {
    let tmpdir = TempDir::new().unwrap();
    let config = write_config(&tmpdir, r#"{ "brain": { "s1": "brain/s1" } }"#);
    let touch = |path: &Path| {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    };

    touch(&tmpdir.path().join("fastq/brain/s1_1.fastq.gz"));
    touch(&tmpdir.path().join("fastq/brain/s1_2.fastq.gz"));
    touch(&tmpdir.path().join("salmon/brain_s1/quant.sf"));

    rnapipe()
        .args(["run", "-p", "salmon", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to be done"));
}

#[test]
fn write_produces_an_ordered_script() {
    let tmpdir = TempDir::new().unwrap();
    let config = write_config(&tmpdir, TWO_SAMPLES);
    let script = tmpdir.path().join("pipeline.sh");

    rnapipe()
        .args(["write", "-p", "salmon,stringtie", "-c"])
        .arg(&config)
        .arg("-o")
        .arg(&script)
        .assert()
        .success();

    let contents = fs::read_to_string(&script).unwrap();
    assert!(contents.starts_with("#!/usr/bin/env bash\nset -euo pipefail\n"));
    assert!(contents.contains("mkdir"));
    assert!(contents.contains("--validateMappings"));
    assert_eq!(contents.matches("salmon quant").count(), 2);
    assert_eq!(contents.matches("\nstringtie ").count(), 2);
}

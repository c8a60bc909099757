#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn generate(dir: &TempDir, name: &str, seed: u64) -> PathBuf {
    let path = dir.path().join(name);
    cargo_bin_cmd!("sendero")
        .args(["generate", "--samples", "40", "--neighbors", "4", "--seed"])
        .arg(seed.to_string())
        .arg("-o")
        .arg(&path)
        .assert()
        .success();
    path
}

fn json_of(args: &[&str], path: &Path) -> Value {
    let output = cargo_bin_cmd!("sendero")
        .args(["--format", "json"])
        .args(args)
        .arg(path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn generate_is_reproducible() {
    let dir = TempDir::new().expect("tempdir");
    let a = generate(&dir, "a.roadmap", 9);
    let b = generate(&dir, "b.roadmap", 9);
    let c = generate(&dir, "c.roadmap", 10);
    let text_a = fs::read_to_string(a).expect("read");
    assert_eq!(text_a, fs::read_to_string(b).expect("read"));
    assert_ne!(text_a, fs::read_to_string(c).expect("read"));
    assert!(text_a.starts_with("40\n"));
}

#[test]
fn stats_reports_counts_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let path = generate(&dir, "map.roadmap", 1);
    let json = json_of(&["stats"], &path);
    assert_eq!(json["vertices"].as_u64(), Some(40));
    assert_eq!(json["dimension"].as_u64(), Some(2));
    assert_eq!(json["components"].as_u64(), Some(1));
    assert!(json["edges"].as_u64().is_some_and(|e| e > 0));
    assert_eq!(json["bounds_min"].as_array().map(Vec::len), Some(2));
}

#[test]
fn merge_shifts_later_inputs() {
    let dir = TempDir::new().expect("tempdir");
    let first = generate(&dir, "a.roadmap", 2);
    let second = generate(&dir, "b.roadmap", 3);
    let merged = dir.path().join("merged.roadmap");
    let output = cargo_bin_cmd!("sendero")
        .args(["--format", "json", "merge"])
        .arg(&first)
        .arg(&second)
        .arg("-o")
        .arg(&merged)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["offsets"], serde_json::json!([0, 40]));
    assert_eq!(json["vertices"].as_u64(), Some(80));
    assert_eq!(json["components"].as_u64(), Some(2));

    let stats = json_of(&["stats"], &merged);
    assert_eq!(stats["vertices"].as_u64(), Some(80));
    assert_eq!(stats["edges"], json["edges"]);
}

#[test]
fn nearest_returns_sorted_hits() {
    let dir = TempDir::new().expect("tempdir");
    let path = generate(&dir, "map.roadmap", 4);
    let json = json_of(&["nearest", "--point", "0.5,0.5", "-k", "5"], &path);
    let hits = json["hits"].as_array().expect("hits");
    assert_eq!(hits.len(), 5);
    let distances: Vec<f64> = hits
        .iter()
        .map(|h| h["distance"].as_f64().expect("distance"))
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(json["fallback"], Value::Bool(false));
}

#[test]
fn nearest_radius_falls_back_to_closest() {
    let dir = TempDir::new().expect("tempdir");
    let path = generate(&dir, "map.roadmap", 5);
    let json = json_of(&["nearest", "--point", "5,5", "--radius", "0.1"], &path);
    assert_eq!(json["fallback"], Value::Bool(true));
    assert_eq!(json["hits"].as_array().map(Vec::len), Some(1));
}

#[test]
fn nearest_rejects_wrong_dimension() {
    let dir = TempDir::new().expect("tempdir");
    let path = generate(&dir, "map.roadmap", 6);
    cargo_bin_cmd!("sendero")
        .args(["nearest", "--point", "0.5,0.5,0.5"])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn config_file_selects_linear_index() {
    let dir = TempDir::new().expect("tempdir");
    let path = generate(&dir, "map.roadmap", 7);
    let config = dir.path().join("sendero.toml");
    fs::write(&config, "max_query_width = 3\n[index]\nkind = \"linear\"\n").expect("write");
    cargo_bin_cmd!("sendero")
        .arg("--config")
        .arg(&config)
        .args(["nearest", "--point", "0.5,0.5", "-k", "4"])
        .arg(&path)
        .assert()
        .failure();
    cargo_bin_cmd!("sendero")
        .arg("--config")
        .arg(&config)
        .args(["nearest", "--point", "0.5,0.5", "-k", "3"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn missing_roadmap_fails() {
    let dir = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("sendero")
        .arg("stats")
        .arg(dir.path().join("absent.roadmap"))
        .assert()
        .failure();
}

#[test]
fn nearest_text_prints_one_hit_per_line() {
    let dir = TempDir::new().expect("tempdir");
    let path = generate(&dir, "map.roadmap", 8);
    let output = cargo_bin_cmd!("sendero")
        .args(["nearest", "--point", "0.5,0.5", "-k", "3"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[1].parse::<f64>().is_ok());
        assert!(fields[2].starts_with('['));
    }
}

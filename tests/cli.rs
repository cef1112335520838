//! Drives the `pdf-analyzer` binary end to end.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn analyzer_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pdf-analyzer");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/analyzer.sqlite"

[server]
bind = "127.0.0.1:7341"

[uploads]
dir = "{root}/uploads"

[extraction]
timeout_secs = 10
"#,
        root = root.display()
    );

    let config_path = config_dir.join("analyzer.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_analyzer(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = analyzer_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pdf-analyzer at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Uploads `file` and returns the id parsed from "... as PDF ID <n>".
fn upload(config_path: &Path, file: &Path) -> i64 {
    let (stdout, stderr, success) = run_analyzer(config_path, &["upload", file.to_str().unwrap()]);
    assert!(success, "upload failed: stdout={}, stderr={}", stdout, stderr);
    stdout
        .trim()
        .rsplit(' ')
        .next()
        .and_then(|id| id.parse().ok())
        .unwrap_or_else(|| panic!("no id in upload output: {}", stdout))
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_analyzer(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success) = run_analyzer(&config_path, &["init"]);
    assert!(success, "second init failed (not idempotent)");
}

#[test]
fn test_upload_analyze_results_export() {
    let (tmp, config_path) = setup_test_env();
    run_analyzer(&config_path, &["init"]);

    let pdf = tmp.path().join("Mill Manual.pdf");
    fs::write(
        &pdf,
        common::pdf_with_lines(&["Spindle HSK-63;", "Controller FANUC-0i."]),
    )
    .unwrap();

    let id = upload(&config_path, &pdf);
    assert!(tmp
        .path()
        .join("uploads")
        .join(format!("{}_Mill_Manual.pdf", id))
        .exists());

    let id_arg = id.to_string();
    let (stdout, stderr, success) = run_analyzer(&config_path, &["analyze", &id_arg]);
    assert!(success, "analyze failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("components_found: 2"), "got: {}", stdout);

    let (stdout, _, success) = run_analyzer(&config_path, &["results", &id_arg]);
    assert!(success);
    assert!(stdout.contains("filename:      Mill_Manual.pdf"));
    assert!(stdout.contains("HSK-63"));
    assert!(stdout.contains("FANUC-0i"));

    let out = tmp.path().join("out.csv");
    let (_, stderr, success) = run_analyzer(
        &config_path,
        &[
            "export",
            &id_arg,
            "--format",
            "csv",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success, "export failed: {}", stderr);
    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("pdf_id,pdf_filename,analysis_type,component_name\r\n"));
    assert!(csv.contains(&format!("{},Mill_Manual.pdf,component_extraction,HSK-63", id)));

    let (stdout, _, success) = run_analyzer(&config_path, &["export", &id_arg]);
    assert!(success);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["pdf_id"], id);
    assert_eq!(json["components"][0], "HSK-63");
}

#[test]
fn test_unreadable_pdf_is_analyzed_with_warning() {
    let (tmp, config_path) = setup_test_env();
    run_analyzer(&config_path, &["init"]);

    let pdf = tmp.path().join("scan.pdf");
    fs::write(&pdf, b"not a valid pdf").unwrap();
    let id = upload(&config_path, &pdf).to_string();

    let (stdout, stderr, success) = run_analyzer(&config_path, &["analyze", &id]);
    assert!(success, "analyze failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("components_found: 0"));
    assert!(stdout.contains("warning"));
}

#[test]
fn test_upload_rejects_non_pdf() {
    let (tmp, config_path) = setup_test_env();
    run_analyzer(&config_path, &["init"]);

    let txt = tmp.path().join("notes.txt");
    fs::write(&txt, "spindle X").unwrap();

    let (_, stderr, success) = run_analyzer(&config_path, &["upload", txt.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Invalid file type"), "got: {}", stderr);
}

#[test]
fn test_unknown_id_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_analyzer(&config_path, &["init"]);

    let (_, stderr, success) = run_analyzer(&config_path, &["results", "99"]);
    assert!(!success);
    assert!(stderr.contains("PDF with id 99 not found"), "got: {}", stderr);

    let (_, stderr, success) = run_analyzer(&config_path, &["export", "99", "--format", "xml"]);
    assert!(!success);
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_bad_read_policy_is_rejected() {
    let (_tmp, config_path) = setup_test_env();
    let mut content = fs::read_to_string(&config_path).unwrap();
    content.push_str("\n[analysis]\nread_policy = \"newest\"\n");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_analyzer(&config_path, &["results", "1"]);
    assert!(!success);
    assert!(stderr.contains("newest"), "got: {}", stderr);
}

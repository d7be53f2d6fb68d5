use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn accobot_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("accobot");
    path
}

/// Sandbox at `<tmp>/data` with one quarter folder of mixed files, and a
/// remote URL nothing listens on.
fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let q1 = root.join("data").join("q1");
    fs::create_dir_all(&q1).unwrap();
    fs::write(
        q1.join("balance.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<BalanceSheet>
  <company>Acme Holdings</company>
  <period>2024-Q1</period>
  <assets>1200</assets>
</BalanceSheet>"#,
    )
    .unwrap();
    fs::write(
        q1.join("expenses.xml"),
        r#"<expense_report period="2024-03"><entity>Acme</entity></expense_report>"#,
    )
    .unwrap();
    fs::write(q1.join("broken.xml"), "<ledger><entry>1</ledger>").unwrap();
    fs::write(q1.join("readme.txt"), "not xml").unwrap();
    fs::create_dir_all(root.join("data").join("empty")).unwrap();

    let config_content = format!(
        r#"[sandbox]
root = "{}/data"

[remote]
base_url = "http://127.0.0.1:9/api"
timeout_ms = 2000

[logging]
level = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("accobot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_accobot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = accobot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("ACCOBOT_REMOTE_URL")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run accobot binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_scan_json_reports_every_xml_file() {
    let (tmp, config) = setup_test_env();
    let q1 = tmp.path().join("data").join("q1");

    let (stdout, stderr, success) = run_accobot(&config, &["scan", q1.to_str().unwrap(), "--json"]);
    assert!(success, "scan failed: {}", stderr);

    let record: Value = serde_json::from_str(&stdout).unwrap();
    let files = record["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(record["validCount"], 2);
    assert_eq!(record["invalidCount"], 1);

    let balance = files
        .iter()
        .find(|f| f["fileName"] == "balance.xml")
        .unwrap();
    assert_eq!(balance["isValid"], true);
    assert_eq!(balance["documentType"], "financial_statement");
    assert_eq!(balance["period"], "2024-Q1");
    assert_eq!(balance["company"], "Acme Holdings");

    let broken = files.iter().find(|f| f["fileName"] == "broken.xml").unwrap();
    assert_eq!(broken["isValid"], false);
    assert!(broken["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("XML parsing failed"));
}

#[test]
fn test_scan_table_output() {
    let (tmp, config) = setup_test_env();
    let q1 = tmp.path().join("data").join("q1");

    let (stdout, _, success) = run_accobot(&config, &["scan", q1.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains(" UTC)"), "stdout: {}", stdout);
    assert!(stdout.contains("xml files: 3 (valid: 2, invalid: 1)"));
    assert!(stdout.contains("expense_report"));
}

#[test]
fn test_scan_empty_folder() {
    let (tmp, config) = setup_test_env();
    let empty = tmp.path().join("data").join("empty");

    let (stdout, _, success) = run_accobot(&config, &["scan", empty.to_str().unwrap(), "--json"]);
    assert!(success);
    let record: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(record["files"].as_array().unwrap().len(), 0);
    assert_eq!(record["validCount"], 0);
}

#[test]
fn test_scan_rejects_traversal() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, success) = run_accobot(&config, &["scan", "../../etc"]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("sandbox"), "stderr: {}", stderr);
}

#[test]
fn test_scan_rejects_absolute_path_outside_sandbox() {
    let (tmp, config) = setup_test_env();
    let outside = tmp.path().join("config");

    let (_, stderr, success) = run_accobot(&config, &["scan", outside.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Path must be within the sandbox directory"));
}

#[test]
fn test_scan_missing_directory_fails() {
    let (tmp, config) = setup_test_env();
    let missing = tmp.path().join("data").join("nope");

    let (_, stderr, success) = run_accobot(&config, &["scan", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Directory does not exist"), "stderr: {}", stderr);
}

#[test]
fn test_ask_reports_unreachable_service() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, success) = run_accobot(&config, &["ask", "What was Q1 revenue?"]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Network error"), "stderr: {}", stderr);
}

#[test]
fn test_ask_rejects_blank_question() {
    let (_tmp, config) = setup_test_env();

    let (_, stderr, success) = run_accobot(&config, &["ask", "   "]);
    assert!(!success);
    assert!(stderr.contains("Message is required"));
}

#[test]
fn test_invalid_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("accobot.toml");
    fs::write(
        &config_path,
        "[remote]\nbase_url = \"ftp://example.com\"\n",
    )
    .unwrap();

    let (_, stderr, success) = run_accobot(&config_path, &["scan", "."]);
    assert!(!success);
    assert!(stderr.contains("Must be http or https"));
}

#[test]
fn test_remote_url_env_overrides_config() {
    let (_tmp, config) = setup_test_env();

    let output = Command::new(accobot_binary())
        .arg("--config")
        .arg(&config)
        .args(["ask", "What was Q1 revenue?"])
        .env_remove("RUST_LOG")
        .env("ACCOBOT_REMOTE_URL", "ftp://answers.example/api")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("Must be http or https"), "stderr: {}", stderr);
}

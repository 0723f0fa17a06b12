// Integration tests for the `lenswatch` binary: exit codes and the --json
// stdout contract.
//
// Run with: cargo test -p lenswatch-cli --test cli_tests -- --nocapture

use std::path::PathBuf;
use std::process::{Command, Output};

fn lenswatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lenswatch"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("LENSWATCH_LOG");
    cmd
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../resolve/tests/fixtures")
}

fn watch_toml() -> String {
    fixtures_dir().join("watch.toml").to_string_lossy().into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(stdout: &[u8]) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");

    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}")
    })
}

/// Write `body` as watch.toml in a fresh temp dir. No data file is created.
fn temp_config(body: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watch.toml");
    std::fs::write(&path, body).unwrap();
    let path = path.to_string_lossy().into_owned();
    (dir, path)
}

const MINIMAL: &str = r#"
name = "minimal"

[catalogs.lenses]
kind = "lens"
file = "missing-lenses.csv"

[sources.shop]
label = "Shop"
kind = "new"
target = "lenses"
file = "missing-shop.csv"
columns = { title = "title", price = "price", url = "url" }
"#;

// ===========================================================================
// lenswatch run
// ===========================================================================

#[test]
fn run_json_produces_single_value() {
    let output = lenswatch()
        .args(["run", &watch_toml(), "--json"])
        .output()
        .expect("lenswatch run --json");

    assert!(output.status.success(), "exit code: {:?}\nstderr: {}", output.status, stderr(&output));

    let val = assert_single_json(&output.stdout);
    assert_eq!(val["meta"]["config_name"], "Fuji deals");
    assert_eq!(
        val["deals"]["camara"].as_object().expect("camara deals").len(),
        4
    );
    assert_eq!(val["merged"]["lenses"]["XF 35mm F1.4 R"].as_array().unwrap().len(), 2);
    assert_eq!(val["summary"]["sources"]["lens_ads"]["filtered"], 1);
}

#[test]
fn run_without_json_keeps_stdout_empty() {
    let output = lenswatch().args(["run", &watch_toml()]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());

    let err = stderr(&output);
    assert!(err.contains("'Fuji deals'"), "stderr: {err}");
    assert!(err.contains("camara: 5 listing(s), 4 resolved"), "stderr: {err}");
}

#[test]
fn run_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("deals.json");

    let output = lenswatch()
        .args(["run", &watch_toml(), "--output", out.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["deals"]["camera_ads"]["x-t4"][0]["kind"], "second_hand");
}

#[test]
fn run_missing_data_file_is_runtime_error() {
    let (_dir, path) = temp_config(MINIMAL);
    let output = lenswatch().args(["run", &path]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("missing-lenses.csv"));
}

#[test]
fn run_missing_config_is_runtime_error() {
    let output = lenswatch().args(["run", "no-such-watch.toml"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("cannot read config"));
}

// ===========================================================================
// lenswatch validate
// ===========================================================================

#[test]
fn validate_fixture_config() {
    let output = lenswatch().args(["validate", &watch_toml()]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("valid: 'Fuji deals' with 2 catalog(s), 3 source(s), 1 merge group(s)"));
}

#[test]
fn validate_does_not_read_data() {
    let (_dir, path) = temp_config(MINIMAL);
    let output = lenswatch().args(["validate", &path]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn validate_unknown_target_is_invalid_config() {
    let (_dir, path) = temp_config(&MINIMAL.replace("target = \"lenses\"", "target = \"bodies\""));
    let output = lenswatch().args(["validate", &path]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("bodies"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
}

#[test]
fn validate_bad_rule_pattern_is_invalid_config() {
    let body = format!("{MINIMAL}\n[[sources.shop.sanitize.rules]]\npattern = \"(unclosed\"\n");
    let (_dir, path) = temp_config(&body);
    let output = lenswatch().args(["validate", &path]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

// ===========================================================================
// lenswatch resolve
// ===========================================================================

#[test]
fn resolve_titles_json() {
    let output = lenswatch()
        .args([
            "resolve",
            &watch_toml(),
            "--source",
            "camara",
            "FUJIFILM XF 35MM F1.4 R",
            "FUJIFILM XF 56MM F1.2 R",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output.stdout);
    let arr = val.as_array().expect("array of resolutions");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["id"], "XF 35mm F1.4 R");
    assert_eq!(arr[0]["sanitized"], "XF 35MM F1.4 R");
    assert_eq!(arr[1]["id"], "XF 56mm F1.2 R");
    assert!(arr[1].get("reason").is_none());
}

#[test]
fn resolve_unresolved_title_exits_5() {
    let output = lenswatch()
        .args(["resolve", &watch_toml(), "-s", "lens_ads", "Trépied carbone"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Trépied carbone => unresolved (no_grammar_match"), "stdout: {stdout}");
    assert!(stderr(&output).contains("1 of 1 title(s) unresolved"));
}

#[test]
fn resolve_unknown_source_is_usage_error() {
    let output = lenswatch()
        .args(["resolve", &watch_toml(), "--source", "ebay", "XF 35MM F1.4 R"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("camara, lens_ads, camera_ads"));
}

#[test]
fn missing_subcommand_is_usage_error() {
    let output = lenswatch().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

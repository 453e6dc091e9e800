//! End-to-end tests for the `pw` binary.
//!
//! Every test runs with `HOME` and `XDG_CONFIG_HOME` pointed at a temp
//! directory so a user config file cannot leak in.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn pw_binary() -> String {
    env!("CARGO_BIN_EXE_pw").to_string()
}

fn pw(home: &Path, args: &[&str]) -> Output {
    Command::new(pw_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run pw")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// Test a script covering every operation produces the expected layout.
#[test]
fn test_replay_full_script() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("script.jsonl");
    std::fs::write(
        &script,
        r#"{"op":"init"}
{"op":"tag","key":"env","value":"test"}
{"op":"tag_append","key":"ids","value":1}
{"op":"tag_append","key":"ids","value":[2,3]}

{"op":"start","group":"db","key":"users","tags":{"rows":3}}
{"op":"sleep","ms":10}
{"op":"stop","group":"db","key":"users","tags":{"cached":false}}
{"op":"loop","group":"batch"}
{"op":"loop","group":"batch"}
{"op":"end_loop","group":"batch"}
{"op":"detect","group":"cache_miss","tags":{"key":"a"}}
{"op":"stop","group":"orphan"}
{"op":"finalize"}
"#,
    )
    .unwrap();

    let output = pw(temp.path(), &["replay", script.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "replay should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // Reserved sections first, then groups in first-use order
    let stdout = String::from_utf8_lossy(&output.stdout);
    let positions: Vec<usize> = [
        r#"{"init":{"#,
        r#""tags":{"#,
        r#""db":["#,
        r#""batch":["#,
        r#""cache_miss":["#,
        r#""orphan":["#,
    ]
    .iter()
    .map(|section| stdout.find(section).unwrap_or_else(|| panic!("missing {section}")))
    .collect();
    assert!(positions.is_sorted(), "sections out of order: {stdout}");

    let records = json(&output);

    let init = &records["init"];
    assert!(init["version"].as_str().unwrap().starts_with("pw-core/"));
    assert!(init["readble_end_time"].is_string());
    assert!(init["run_time"].as_f64().unwrap() >= 0.009);
    assert!(init["max_memory"].as_u64().unwrap() >= init["end_memory"].as_u64().unwrap());

    assert_eq!(records["tags"]["env"], "test");
    assert_eq!(records["tags"]["ids"], serde_json::json!([1, 2, 3]));

    let db = &records["db"][0];
    assert_eq!(db["key"], "users");
    assert!(db["run_time"].as_f64().unwrap() >= 0.009);
    assert_eq!(db["tags"], serde_json::json!({"cached": false, "rows": 3}));

    let batch = records["batch"].as_array().unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0]["unix_end_time"], batch[1]["unix_start_time"]);
    assert!(batch[1]["run_time"].is_number());

    let miss = &records["cache_miss"][0];
    assert!(miss.get("unix_end_time").is_none());
    assert_eq!(miss["tags"]["key"], "a");

    let orphan = &records["orphan"][0];
    assert!(orphan["unix_start_time"].is_null());
    assert!(orphan["run_time"].is_null());
    assert!(orphan["end_time"].is_number());
}

/// Test a malformed script line is reported with its line number.
#[test]
fn test_replay_reports_bad_line() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("script.jsonl");
    std::fs::write(&script, "{\"op\":\"init\"}\nnot json\n").unwrap();

    let output = pw(temp.path(), &["replay", script.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "stderr should name the line: {stderr}");
}

/// Test `pw run` records one tagged event for a successful command.
#[test]
fn test_run_records_command() {
    let temp = TempDir::new().unwrap();
    let output = pw(temp.path(), &["run", "--tag", "env=ci", "--", "true"]);
    assert!(
        output.status.success(),
        "run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let records = json(&output);
    let event = &records["command"][0];
    assert_eq!(event["tags"]["command"], "true");
    assert_eq!(event["tags"]["env"], "ci");
    assert_eq!(event["tags"]["exit_code"], 0);
    assert!(event["run_time"].as_f64().unwrap() >= 0.0);
    assert!(records["init"]["run_time"].is_number());
}

/// Test the child's exit code is forwarded and its stdout kept off ours.
#[test]
fn test_run_forwards_exit_code() {
    let temp = TempDir::new().unwrap();
    let output = pw(
        temp.path(),
        &["run", "--group", "sh", "--", "sh", "-c", "echo hello; exit 3"],
    );
    assert_eq!(output.status.code(), Some(3));

    let records = json(&output);
    assert_eq!(records["sh"][0]["tags"]["exit_code"], 3);
    assert!(String::from_utf8_lossy(&output.stderr).contains("hello"));
}

/// Test `--output` writes the file and leaves stdout empty.
#[test]
fn test_output_flag_writes_file() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("records.json");
    let output = pw(
        temp.path(),
        &["run", "--pretty", "--output", out.to_str().unwrap(), "--", "true"],
    );
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("\n  \"init\""), "output should be pretty: {content}");
    let records: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert!(records["command"].is_array());
}

/// Test the config file sets precision and pretty output.
#[test]
fn test_config_file_applies() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("pw.toml");
    std::fs::write(&config, "precision = 0\npretty = true\n").unwrap();

    let output = pw(
        temp.path(),
        &["--config", config.to_str().unwrap(), "run", "--", "true"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\n  \"init\""));

    let records = json(&output);
    let start = records["init"]["start_time"].as_f64().unwrap();
    assert!((start - start.round()).abs() < f64::EPSILON);
}

/// Test a missing program fails without printing records.
#[test]
fn test_run_missing_program_fails() {
    let temp = TempDir::new().unwrap();
    let output = pw(temp.path(), &["run", "--", "pw-definitely-not-a-program"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

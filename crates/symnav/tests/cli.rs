//! CLI integration tests.
//!
//! These run the binary against temporary projects. None of them needs a
//! language server to be installed.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn symnav(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_symnav"))
        .arg("--project")
        .arg(project)
        .arg("--log-stderr")
        .args(args)
        .env("HOME", project.join(".home"))
        .env("XDG_CONFIG_HOME", project.join(".home/.config"))
        .env_remove("SYMNAV_CONFIG_CONTENT")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "just text\n").unwrap();
    dir
}

#[test]
fn test_help_command() {
    let dir = project();
    let output = symnav(dir.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("find"));
    assert!(stdout.contains("serve"));
}

#[test]
fn test_tools_command() {
    let dir = project();
    let output = symnav(dir.path(), &["tools"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 12);
    assert!(stdout.contains("get_symbols_overview"));
}

#[test]
fn test_disabled_tools_are_not_listed() {
    let dir = project();
    std::fs::write(
        dir.path().join("symnav.jsonc"),
        "{\n  // read-only setup\n  \"disabled_tools\": [\"rename_symbol\", \"replace_symbol_body\"]\n}\n",
    )
    .unwrap();

    let output = symnav(dir.path(), &["tools", "--json"]);
    assert!(output.status.success());
    let tools: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 10);
    assert!(!names.contains(&"rename_symbol"));
}

#[test]
fn test_config_command_shows_project_config() {
    let dir = project();
    std::fs::write(dir.path().join("symnav.json"), r#"{"output_format": "json"}"#).unwrap();
    let output = symnav(dir.path(), &["config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("symnav.json"));
    assert!(stdout.contains("\"output_format\": \"json\""));
}

#[test]
fn test_overview_of_directory_fails() {
    let dir = project();
    let output = symnav(dir.path(), &["overview", "src"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("directory"));
}

#[test]
fn test_overview_of_missing_file_fails() {
    let dir = project();
    let output = symnav(dir.path(), &["overview", "src/missing.rs"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_file_without_language_server_is_unavailable() {
    let dir = project();
    let output = symnav(dir.path(), &["hover", "notes.txt", "0", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unavailable"));
}

#[test]
fn test_call_with_invalid_arguments() {
    let dir = project();
    let output = symnav(dir.path(), &["call", "find_symbol", r#"{"depth": 2}"#]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Validation error"));
}

#[test]
fn test_serve_answers_requests() {
    use std::io::Write;
    use std::process::Stdio;

    let dir = project();
    let mut child = Command::new(env!("CARGO_BIN_EXE_symnav"))
        .arg("--project")
        .arg(dir.path())
        .args(["--log-stderr", "serve"])
        .env("HOME", dir.path().join(".home"))
        .env("XDG_CONFIG_HOME", dir.path().join(".home/.config"))
        .env_remove("SYMNAV_CONFIG_CONTENT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn");

    {
        let stdin = child.stdin.as_mut().unwrap();
        writeln!(stdin, r#"{{"id": 1, "tool": "get_symbols_overview", "args": {{"relative_path": "src"}}}}"#).unwrap();
        writeln!(stdin, r#"{{"id": 2, "tool": "restart_language_server"}}"#).unwrap();
    }
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let responses: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["ok"], false);
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["output"], "OK");
}

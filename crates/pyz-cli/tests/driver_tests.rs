//! Tests for running debug info requests against files on disk.

use clap::Parser;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pyz_cli::args::CliArgs;
use pyz_cli::driver::{build_request, run};

fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn parse_args(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("pyz-debug").chain(args.iter().copied())).unwrap()
}

fn run_to_string(args: &CliArgs) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run(args, false, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn builds_requests_from_positionals() {
    let args = parse_args(&["main.py", "types", "--start", "4"]);
    let request = build_request(&args).unwrap();
    assert_eq!(request.path, PathBuf::from("main.py"));
    assert_eq!(
        request.args,
        vec![json!("main.py"), json!("types"), json!(4), json!(0)]
    );

    let args = parse_args(&["main.py", "tokens", "--start", "4"]);
    let request = build_request(&args).unwrap();
    assert_eq!(request.args, vec![json!("main.py"), json!("tokens")]);
}

#[test]
fn builds_requests_from_json() {
    let args = parse_args(&["--request", r#"["lib/a.py", "types", 1, 2]"#]);
    let request = build_request(&args).unwrap();
    assert_eq!(request.path, PathBuf::from("lib/a.py"));
    assert_eq!(request.args.len(), 4);

    let args = parse_args(&["--request", "{}"]);
    assert!(build_request(&args).is_err());
    let args = parse_args(&["--request", "[3, \"types\"]"]);
    assert!(build_request(&args).is_err());
}

#[test]
fn dumps_nodes_of_a_file() {
    let dir = TempDir::new().unwrap();
    let path = write_source(dir.path(), "sample.py", "x = 1\n");
    let args = parse_args(&[path.to_str().unwrap(), "nodes"]);

    let output = run_to_string(&args).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], format!("* Dump debug info for '{}'", path.display()));
    assert_eq!(lines[1], "* Node info");
    assert!(lines[2].contains("(Module, p:0 "), "{output}");
    assert!(!output.contains('\u{1b}'), "{output}");
}

#[test]
fn dumps_types_through_a_raw_request() {
    let dir = TempDir::new().unwrap();
    let path = write_source(dir.path(), "sample.py", "def f(x):\n    return x\n");
    let request = serde_json::to_string(&json!([path.to_str().unwrap(), "types", 21, 22])).unwrap();
    let args = parse_args(&["--request", &request]);

    let output = run_to_string(&args).unwrap();
    assert!(output.contains("* Type info\n"), "{output}");
    assert!(
        output.contains("Expression node found at (1,11)-(1,12) from the given span (1,11)-(1,12)"),
        "{output}"
    );
    assert!(output.contains("\"category\": \"Unknown\""), "{output}");
}

#[test]
fn empty_reports_are_errors() {
    let dir = TempDir::new().unwrap();
    let path = write_source(dir.path(), "sample.py", "x = 1\n");
    let args = parse_args(&[path.to_str().unwrap(), "types"]);

    let error = run_to_string(&args).unwrap_err();
    assert!(error.to_string().starts_with("no debug info for"), "{error}");
}

#[test]
fn missing_files_are_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.py");
    let args = parse_args(&[path.to_str().unwrap(), "tokens"]);

    let error = run_to_string(&args).unwrap_err();
    assert!(error.to_string().starts_with("failed to read"), "{error}");
}

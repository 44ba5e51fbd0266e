//! Integration tests for the `invoiceflow` CLI binary.
//!
//! These run the CLI as a subprocess against an address nothing listens on,
//! so they cover argument handling and error reporting without a server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::Command;

/// Helper: locate the `invoiceflow` binary built by `cargo test`.
fn invoiceflow_bin() -> String {
    let path = env!("CARGO_BIN_EXE_invoiceflow");
    assert!(
        Path::new(path).exists(),
        "invoiceflow binary not found at {path}"
    );
    path.to_owned()
}

/// Helper: run invoiceflow with args and return (`exit_code`, stdout, stderr).
fn run(args: &[&str], tab: Option<&str>) -> (i32, String, String) {
    let mut cmd = Command::new(invoiceflow_bin());
    cmd.args(args)
        .env("INVOICEFLOW_ADDR", "http://127.0.0.1:19998") // Non-existent server
        .env_remove("INVOICEFLOW_TAB");
    if let Some(tab) = tab {
        cmd.env("INVOICEFLOW_TAB", tab);
    }
    let output = cmd.output().expect("failed to execute invoiceflow");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"], None);
    assert_eq!(code, 0, "invoiceflow --version should exit 0");
    assert!(stdout.contains("invoiceflow"), "version output: {stdout}");
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"], None);
    assert_eq!(code, 0, "invoiceflow --help should exit 0");
    assert!(stdout.contains("InvoiceFlow CLI"), "help: {stdout}");
    for command in ["status", "open", "login", "invoices", "assessment", "INVOICEFLOW_TAB"] {
        assert!(stdout.contains(command), "help should mention '{command}'");
    }
}

#[test]
fn test_subcommand_help() {
    for sub in ["nav", "shell", "invoices", "assessment"] {
        let (code, stdout, _) = run(&[sub, "--help"], None);
        assert_eq!(code, 0, "{sub} --help should exit 0");
        assert!(!stdout.is_empty(), "{sub} --help should produce output");
    }
}

// ── Argument validation ──────────────────────────────────────────────

#[test]
fn test_unknown_page_is_rejected() {
    let (code, _, stderr) = run(&["shell", "go", "billing"], Some("t"));
    assert_eq!(code, 2, "clap usage errors exit 2");
    assert!(stderr.contains("billing"), "stderr: {stderr}");
}

#[test]
fn test_unknown_bulk_action_is_rejected() {
    let (code, _, _) = run(&["invoices", "bulk", "archive"], Some("t"));
    assert_eq!(code, 2);
}

// ── Error reporting ──────────────────────────────────────────────────

#[test]
fn test_tab_commands_need_a_tab() {
    let (code, _, stderr) = run(&["invoices", "list"], None);
    assert_eq!(code, 1);
    assert!(stderr.contains("INVOICEFLOW_TAB"), "stderr: {stderr}");
}

#[test]
fn test_unreachable_server() {
    let (code, _, stderr) = run(&["status"], None);
    assert_eq!(code, 1);
    assert!(stderr.contains("request failed"), "stderr: {stderr}");
}

#[test]
fn test_failed_export_writes_nothing() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let out = dir.path().join("invoices.csv");
    let (code, _, _) = run(
        &["invoices", "export", "--output", out.to_str().unwrap()],
        Some("t"),
    );
    assert_eq!(code, 1);
    assert!(!out.exists(), "no file should be written on failure");
}

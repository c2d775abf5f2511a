//! Integration tests for the credsift binary.
//!
//! These tests drive the compiled executable end to end without relying on
//! any network service: the remote pass is either disabled or pointed at a
//! port nothing listens on, which exercises the heuristic fallback.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str;
use tempfile::NamedTempFile;

const TICKET: &str = "Dzień dobry,\n\
prosimy o przeniesienie strony.\n\
serwer FTP: ftp.firma.pl\n\
login: jan\n\
hasło: Tajne123\n\
Panel: https://firma.pl/wp-admin\n\
Domena: firma.pl\n\
Nameservers: ns1.hosting.pl, ns2.hosting.pl\n";

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_credsift"))
}

/// Helper to create a temporary message file with test content
fn create_test_message(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(get_binary_path())
        .args(args)
        .env_remove("CREDSIFT_REMOTE_URL")
        .env_remove("CREDSIFT_REMOTE_ENABLED")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute binary")
}

#[test]
fn test_json_report_from_file() {
    let file = create_test_message(TICKET);
    let path = file.path().to_str().unwrap();
    let output = run(&[path, "--format", "json", "--client-id", "c-1", "--ticket", "T-5"]);

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    let report: serde_json::Value = serde_json::from_str(stdout).unwrap();

    assert_eq!(report["metadata"]["tool_name"], "credsift");
    assert_eq!(report["statistics"]["per_category"]["ftp"], 1);
    let ftp = report["records"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["type"] == "ftp")
        .unwrap();
    assert_eq!(ftp["server"], "ftp.firma.pl");
    assert_eq!(ftp["username"], "jan");
    assert_eq!(ftp["password"], "Tajne123");
    assert_eq!(ftp["port"], 21);
    assert_eq!(ftp["clientId"], "c-1");
    assert_eq!(ftp["ticketId"], "T-5");
}

#[test]
fn test_stdin_input() {
    let mut child = Command::new(get_binary_path())
        .args(["-", "--format", "yaml", "--no-remote"])
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn binary");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(TICKET.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("source: stdin"));
    assert!(stdout.contains("ftp.firma.pl"));
}

#[test]
fn test_text_output() {
    let file = create_test_message(TICKET);
    let output = run(&[file.path().to_str().unwrap(), "--client-name", "Firma"]);

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("FTP accounts"));
    assert!(stdout.contains("Client: Firma"));
    assert!(!stdout.contains("\u{1b}["), "NO_COLOR must disable styling");
}

#[test]
fn test_csv_category_output() {
    let file = create_test_message(TICKET);
    let output = run(&[
        file.path().to_str().unwrap(),
        "--format",
        "csv",
        "--category",
        "domain",
    ]);

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("Domain,Nameservers"));
    assert_eq!(lines.next(), Some("firma.pl,ns1.hosting.pl; ns2.hosting.pl"));
}

#[test]
fn test_csv_empty_category_fails() {
    let file = create_test_message(TICKET);
    let output = run(&[
        file.path().to_str().unwrap(),
        "--format",
        "csv",
        "--category",
        "email",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("empty"), "{stderr}");
}

#[test]
fn test_output_dir_grouped_export() {
    let file = create_test_message(TICKET);
    let dir = tempfile::tempdir().unwrap();
    let output = run(&[
        file.path().to_str().unwrap(),
        "--format",
        "json",
        "--layout",
        "grouped",
        "--client-id",
        "c-9",
        "--client-name",
        "Firma",
        "--output-dir",
        dir.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let written = dir.path().join("credentials.json");
    let grouped: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(grouped["c-9"]["clientName"], "Firma");
    assert!(grouped["c-9"]["tickets"]["general"]["credentials"].is_array());
    assert!(grouped["c-9"]["clientInfo"]["dateAdded"].is_string());
}

#[test]
fn test_output_dir_csv_per_category() {
    let file = create_test_message(TICKET);
    let dir = tempfile::tempdir().unwrap();
    let output = run(&[
        file.path().to_str().unwrap(),
        "--format",
        "csv",
        "--output-dir",
        dir.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert!(dir.path().join("credentials-ftp.csv").exists());
    assert!(dir.path().join("credentials-domain.csv").exists());
    assert!(!dir.path().join("credentials-email.csv").exists());
}

#[test]
fn test_empty_input_is_an_error() {
    let file = create_test_message("   \n\t\n");
    let output = run(&[file.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("empty"), "{stderr}");
}

#[test]
fn test_missing_file() {
    let output = run(&["/nonexistent/ticket.txt"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("/nonexistent/ticket.txt"));
}

#[test]
fn test_unreachable_remote_falls_back() {
    let file = create_test_message(TICKET);
    let output = run(&[
        file.path().to_str().unwrap(),
        "--format",
        "json",
        "--remote-url",
        "http://127.0.0.1:9/infer",
        "--remote-timeout",
        "2",
        "--verbose",
        "0",
    ]);

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_str(str::from_utf8(&output.stdout).unwrap()).unwrap();
    assert_eq!(report["statistics"]["extraction_source"], "heuristic_fallback");
    assert_eq!(report["statistics"]["per_category"]["ftp"], 1);
}

#[test]
fn test_config_file_is_applied() {
    let file = create_test_message(TICKET);
    let config = create_test_message("[output]\npretty_json = false\n");
    let output = run(&[
        file.path().to_str().unwrap(),
        "--format",
        "json",
        "--config",
        config.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert_eq!(stdout.trim_end().lines().count(), 1);
}

#[test]
fn test_invalid_config_file() {
    let file = create_test_message(TICKET);
    let config = create_test_message("[windows]\ncredential = 0\n");
    let output = run(&[
        file.path().to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("windows.credential"), "{stderr}");
}

#[test]
fn test_generate_schema() {
    let output = run(&["--generate-schema"]);
    assert!(output.status.success());
    let schema: serde_json::Value =
        serde_json::from_str(str::from_utf8(&output.stdout).unwrap()).unwrap();
    assert_eq!(schema["title"], "ExtractionReport");
}

#[test]
fn test_help_output() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    for flag in ["--client-id", "--format", "--output-dir", "--remote-url", "--include-context"] {
        assert!(stdout.contains(flag), "help should mention {flag}");
    }
}

#[test]
fn test_version_output() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

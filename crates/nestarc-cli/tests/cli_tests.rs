//! Integration tests for nestarc-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use nestarc_core::test_utils::create_encrypted_zip;
use nestarc_core::test_utils::create_test_7z;
use nestarc_core::test_utils::create_test_tar;
use nestarc_core::test_utils::create_test_zip;
use nestarc_core::test_utils::gzip;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn nestarc_cmd() -> Command {
    cargo_bin_cmd!("nestarc")
}

/// Writes `data` as `name` inside `dir`.
fn write_archive(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, data).expect("failed to write archive");
    path
}

/// `a.zip` (password "111") holding `x.txt` and `b.7z` (password "222")
/// holding `y.txt`.
fn scenario(dir: &TempDir) -> PathBuf {
    let inner = create_test_7z(vec![("y.txt", b"inner text")], Some("222"));
    let outer = create_encrypted_zip(vec![("x.txt", b"outer text"), ("b.7z", &inner)], "111");
    write_archive(dir, "a.zip", &outer)
}

fn plain_nested(dir: &TempDir) -> PathBuf {
    let inner = create_test_zip(vec![("y.txt", b"inner")]);
    let outer = create_test_zip(vec![("docs/x.txt", b"hello"), ("b.zip", &inner)]);
    write_archive(dir, "a.zip", &outer)
}

#[test]
fn test_version_flag() {
    nestarc_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nestarc"));
}

#[test]
fn test_help_lists_subcommands() {
    nestarc_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_info_prints_tree() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = plain_nested(&temp);

    nestarc_cmd()
        .arg("info")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("a.zip [archive]"))
        .stdout(predicate::str::contains("docs/"))
        .stdout(predicate::str::contains("b.zip [archive]"))
        .stdout(predicate::str::contains("y.txt"));
}

#[test]
fn test_info_json_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = plain_nested(&temp);

    let output = nestarc_cmd()
        .arg("info")
        .arg("--json")
        .arg(&archive)
        .arg("--preview")
        .arg("a.zip/docs/*.txt")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).expect("invalid JSON output");
    assert_eq!(json["status"], "success");
    assert_eq!(json["operation"], "info");
    assert_eq!(json["data"]["tree"]["name"], "a.zip");
    assert_eq!(json["data"]["tree"]["archived"], true);
    assert_eq!(json["data"]["previews"][0]["path"], "a.zip/docs/x.txt");
    assert_eq!(json["data"]["previews"][0]["content"], "hello");
}

#[test]
fn test_info_reports_missing_nested_password() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = scenario(&temp);

    nestarc_cmd()
        .arg("info")
        .arg(&archive)
        .arg("--password")
        .arg("111")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Password required: a.zip/b.7z"))
        .stderr(predicate::str::contains("1 archive(s) need a password"));
}

#[test]
fn test_info_with_all_passwords() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = scenario(&temp);

    nestarc_cmd()
        .arg("info")
        .arg(&archive)
        .arg("-p")
        .arg("111")
        .arg("--entry-password")
        .arg("a.zip/b.7z=222")
        .assert()
        .success()
        .stdout(predicate::str::contains("b.7z [archive, encrypted]"))
        .stdout(predicate::str::contains("y.txt"));
}

#[test]
fn test_info_json_reports_failures() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = scenario(&temp);

    let output = nestarc_cmd()
        .arg("info")
        .arg("--json")
        .arg(&archive)
        .arg("-p")
        .arg("111")
        .arg("-e")
        .arg("a.zip/b.7z=wrong")
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).expect("invalid JSON output");
    assert_eq!(json["status"], "error");
    let failure = &json["data"]["passwordFailures"][0];
    assert_eq!(failure["filename"], "a.zip/b.7z");
    assert_eq!(failure["passwordInvalid"], true);
}

#[test]
fn test_info_rejects_non_archive() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let path = write_archive(&temp, "notes.txt", b"0123456789");

    nestarc_cmd()
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a recognized archive"));
}

#[test]
fn test_info_nonexistent_archive() {
    nestarc_cmd()
        .arg("info")
        .arg("nonexistent.zip")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_info_discard() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = plain_nested(&temp);

    nestarc_cmd()
        .arg("info")
        .arg(&archive)
        .arg("--discard")
        .arg("a.zip/docs")
        .assert()
        .success()
        .stdout(predicate::str::contains("docs").not());
}

#[test]
fn test_extract_without_descending() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = plain_nested(&temp);
    let out = temp.path().join("out");

    nestarc_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extraction complete"));

    assert_eq!(fs::read(out.join("a.zip/docs/x.txt")).unwrap(), b"hello");
    assert!(out.join("a.zip/b.zip").is_file());
}

#[test]
fn test_extract_descend() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = plain_nested(&temp);
    let out = temp.path().join("out");

    nestarc_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .arg("--descend")
        .arg("a.zip/b.zip")
        .assert()
        .success();

    assert_eq!(fs::read(out.join("a.zip/b.zip/y.txt")).unwrap(), b"inner");
}

#[test]
fn test_extract_all_with_passwords() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = scenario(&temp);
    let out = temp.path().join("out");

    let output = nestarc_cmd()
        .arg("extract")
        .arg("--json")
        .arg(&archive)
        .arg(&out)
        .arg("--all")
        .arg("-p")
        .arg("111")
        .arg("-e")
        .arg("a.zip/b.7z=222")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).expect("invalid JSON output");
    assert_eq!(json["operation"], "extract");
    assert_eq!(json["data"]["files_extracted"], 2);
    assert_eq!(json["data"]["archives_entered"], 1);
    assert_eq!(fs::read(out.join("a.zip/x.txt")).unwrap(), b"outer text");
    assert_eq!(fs::read(out.join("a.zip/b.7z/y.txt")).unwrap(), b"inner text");
}

#[test]
fn test_extract_all_keeps_locked_archive() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = scenario(&temp);
    let out = temp.path().join("out");

    nestarc_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .arg("--all")
        .arg("-p")
        .arg("111")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.zip/b.7z is locked"));

    assert!(out.join("a.zip/b.7z").is_file());
}

#[test]
fn test_extract_refuses_overwrite_without_force() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = plain_nested(&temp);
    let out = temp.path().join("out");

    nestarc_cmd().arg("extract").arg(&archive).arg(&out).assert().success();
    nestarc_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .assert()
        .failure();
    nestarc_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .arg("--force")
        .assert()
        .success();
}

#[test]
fn test_extract_tarball() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let tar = create_test_tar(vec![("sample.txt", b"from tar")]);
    let archive = write_archive(&temp, "sample.tar.gz", &gzip(&tar));
    let out = temp.path().join("out");

    nestarc_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .assert()
        .success();

    assert_eq!(
        fs::read(out.join("sample.tar.gz/sample.txt")).unwrap(),
        b"from tar"
    );
}

#[test]
fn test_extract_wrong_root_password() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = scenario(&temp);
    let out = temp.path().join("out");

    nestarc_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .arg("-p")
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password invalid: a.zip"));
}

#[test]
fn test_validate() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = scenario(&temp);

    nestarc_cmd()
        .arg("validate")
        .arg(&archive)
        .arg("--password")
        .arg("111")
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));

    nestarc_cmd()
        .arg("validate")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("HINT"));
}

#[test]
fn test_completion_bash() {
    nestarc_cmd()
        .arg("completion")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("nestarc"));
}

#[test]
fn test_invalid_entry_password_syntax() {
    nestarc_cmd()
        .arg("info")
        .arg("a.zip")
        .arg("--entry-password")
        .arg("missing-separator")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH=PASSWORD"));
}

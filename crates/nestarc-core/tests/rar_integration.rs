//! RAR traversal tests.
//!
//! RAR archives cannot be written from Rust, so these tests use small
//! fixtures from the unrar test suite:
//!
//! - `version.rar`: RAR4, `VERSION` = "unrar-0.4.0"
//! - `crypted.rar`: RAR4, `.gitignore` encrypted with "unrar"
//! - `comment-hpw-password.rar`: RAR5 with encrypted headers, password "password"

#![cfg(feature = "rar")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use nestarc_core::ArchiveError;
use nestarc_core::ArchiveFile;
use nestarc_core::ArchiveFormat;
use nestarc_core::Visit;
use nestarc_core::password_failures;
use nestarc_core::test_utils::create_test_zip;
use std::io::Cursor;
use std::io::Read;

const VERSION_RAR: &[u8] = include_bytes!("fixtures/version.rar");
const CRYPTED_RAR: &[u8] = include_bytes!("fixtures/crypted.rar");
const HEADER_ENCRYPTED_RAR: &[u8] = include_bytes!("fixtures/comment-hpw-password.rar");

fn collect(file: &mut ArchiveFile<'_>) -> nestarc_core::Result<Vec<(String, Vec<u8>)>> {
    let mut seen = Vec::new();
    file.extract(|entry| {
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        seen.push((entry.path().to_owned(), data));
        Ok(Visit::Continue)
    })?;
    Ok(seen)
}

#[test]
fn test_plain_rar_walk() {
    let mut file = ArchiveFile::new("version.rar", Cursor::new(VERSION_RAR.to_vec())).unwrap();
    assert!(!file.encrypted().unwrap());

    let seen = collect(&mut file).unwrap();
    assert_eq!(
        seen,
        vec![("version.rar/VERSION".to_owned(), b"unrar-0.4.0".to_vec())]
    );
    file.validate().unwrap();
}

#[test]
fn test_rar_with_correct_password() {
    let mut file = ArchiveFile::new("crypted.rar", Cursor::new(CRYPTED_RAR.to_vec())).unwrap();
    assert!(file.encrypted().unwrap());
    file.set_password("unrar").unwrap();

    let seen = collect(&mut file).unwrap();
    assert_eq!(seen[0].0, "crypted.rar/.gitignore");
    assert_eq!(seen[0].1, b"target\nCargo.lock\n");
}

#[test]
fn test_rar_with_wrong_password() {
    let mut file = ArchiveFile::new("crypted.rar", Cursor::new(CRYPTED_RAR.to_vec())).unwrap();
    file.set_password("wrong").unwrap();

    let err = collect(&mut file).unwrap_err();
    assert!(matches!(err.root_cause(), ArchiveError::PasswordInvalid));
}

#[test]
fn test_rar_without_password() {
    let mut file = ArchiveFile::new("crypted.rar", Cursor::new(CRYPTED_RAR.to_vec())).unwrap();
    let err = collect(&mut file).unwrap_err();
    assert!(matches!(err.root_cause(), ArchiveError::PasswordRequired));
}

#[test]
fn test_rar_with_encrypted_headers() {
    let data = HEADER_ENCRYPTED_RAR.to_vec();
    let mut file = ArchiveFile::new("hidden.rar", Cursor::new(data)).unwrap();
    assert!(file.encrypted().unwrap());
    file.set_password("password").unwrap();

    let seen = collect(&mut file).unwrap();
    assert_eq!(seen[0].0, "hidden.rar/.gitignore");
}

#[test]
fn test_nested_rar_in_zip() {
    let outer = create_test_zip(vec![("v.rar", VERSION_RAR), ("x.txt", b"hello")]);
    let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();
    file.extracted_entry("a.zip/v.rar").unwrap();

    let mut formats = Vec::new();
    let mut contents = Vec::new();
    file.extract(|entry| {
        formats.push((entry.path().to_owned(), entry.archived()));
        if entry.archived().is_none() {
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            contents.push(data);
        }
        Ok(Visit::Continue)
    })
    .unwrap();

    assert_eq!(
        formats,
        vec![
            ("a.zip/v.rar".to_owned(), Some(ArchiveFormat::Rar)),
            ("a.zip/v.rar/VERSION".to_owned(), None),
            ("a.zip/x.txt".to_owned(), None),
        ]
    );
    assert_eq!(contents, vec![b"unrar-0.4.0".to_vec(), b"hello".to_vec()]);
}

#[test]
fn test_info_reports_locked_nested_rar() {
    let outer = create_test_zip(vec![("c.rar", CRYPTED_RAR)]);
    let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();

    let (tree, result) = file.info(&[]);
    let failures = password_failures(&result.unwrap_err()).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].filename, "a.zip/c.rar");
    assert!(failures[0].password_required);

    let node = tree.node(tree.get("a.zip/c.rar").unwrap());
    assert!(node.archived && node.encrypted && node.password_invalid);
}

#[test]
fn test_info_opens_nested_rar_with_password() {
    let outer = create_test_zip(vec![("c.rar", CRYPTED_RAR)]);
    let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();
    file.set_entry_password("a.zip/c.rar", "unrar").unwrap();

    let (tree, result) = file.info(&["a.zip/c.rar/.gitignore"]);
    result.unwrap();
    assert_eq!(
        tree.previews(),
        vec![(
            "a.zip/c.rar/.gitignore".to_owned(),
            &b"target\nCargo.lock\n"[..]
        )]
    );
}

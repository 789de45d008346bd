//! Depth-first traversal across nesting levels.
//!
//! Each level identifies its own format, iterates entries in archive order
//! and sniffs the head of every file. Archives flagged for extraction are
//! copied into a seekable spill and walked as a nested [`ArchiveFile`] bound
//! to the same policy tree.

use std::io::Read;

use crate::Result;
use crate::archive::ArchiveFile;
use crate::config::HEAD_SIZE;
use crate::config::TraversalConfig;
use crate::error::ArchiveError;
use crate::extraction::entry::Content;
use crate::extraction::entry::Entry;
use crate::extraction::entry::Visit;
use crate::extraction::probe;
use crate::formats::EntryMeta;
use crate::formats::FormatReader;
use crate::formats::detect::sniff;
use crate::formats::dispatch;
use crate::io::CompositeReader;
use crate::path;
use crate::policy::PolicyTree;

/// Handler invoked for every visited entry.
pub type Handler<'h> = dyn FnMut(&mut Entry<'_>) -> Result<Visit> + 'h;

/// Walks `file` and resets its source afterwards.
pub(crate) fn walk(file: &mut ArchiveFile<'_>, handler: &mut Handler<'_>) -> Result<()> {
    let walked = walk_level(file, handler);
    let reset = file.reset();
    log::trace!("reset {}", file.path());
    match (walked, reset) {
        (Ok(()), reset) => reset,
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(reset_err)) => Err(ArchiveError::join(err, reset_err)),
    }
}

fn walk_level(file: &mut ArchiveFile<'_>, handler: &mut Handler<'_>) -> Result<()> {
    let base = file.path();
    let parts = file.parts();

    let encrypted = probe::encrypted(parts.name, &mut *parts.reader, parts.config)
        .map_err(|err| tag(&base, err))?;
    let password = if encrypted {
        parts.policy.password(&base).to_owned()
    } else {
        String::new()
    };
    log::debug!("walking {base} (encrypted={encrypted})");

    let mut extractor = dispatch::identify(parts.name, parts.reader, &password, parts.config)
        .map_err(|err| tag(&base, err))?;

    let mut child_hosts = parts.hosts.to_vec();
    child_hosts.push(parts.name.to_owned());

    let policy = parts.policy;
    let config = parts.config;
    extractor
        .for_each_entry(&mut |meta, content| {
            if config.cancellation().is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }
            let entry_path = path::join(&base, &meta.name);
            let level = Level {
                hosts: &child_hosts,
                policy: &mut *policy,
                config,
            };
            visit_entry(level, &entry_path, meta, content, &mut *handler)
                .map_err(|err| tag(&entry_path, err))
        })
        .map_err(|err| tag(&base, err))
}

/// State one level lends to each of its entries.
struct Level<'l> {
    hosts: &'l [String],
    policy: &'l mut PolicyTree,
    config: &'l TraversalConfig,
}

fn visit_entry(
    level: Level<'_>,
    entry_path: &str,
    meta: &EntryMeta,
    content: &mut dyn Read,
    handler: &mut Handler<'_>,
) -> Result<()> {
    let Level {
        hosts,
        policy,
        config,
    } = level;

    if policy.discarded(entry_path) {
        log::trace!("discarded {entry_path}");
        return Ok(());
    }

    if meta.is_dir {
        let mut entry = Entry::new(
            entry_path.to_owned(),
            meta,
            None,
            Content::Empty,
            policy,
            config,
        );
        handler(&mut entry)?;
        return Ok(());
    }

    let mut head = Vec::with_capacity(HEAD_SIZE);
    (&mut *content)
        .take(HEAD_SIZE as u64)
        .read_to_end(&mut head)?;

    if head.is_empty() {
        let mut entry = Entry::new(
            entry_path.to_owned(),
            meta,
            None,
            Content::Empty,
            policy,
            config,
        );
        handler(&mut entry)?;
        return Ok(());
    }

    let archived = sniff(&head);
    let content: &mut dyn Read = content;
    let reader = CompositeReader::new(head, content);
    let Some(format) = archived else {
        let mut entry = Entry::new(
            entry_path.to_owned(),
            meta,
            None,
            Content::Stream(reader),
            policy,
            config,
        );
        handler(&mut entry)?;
        return Ok(());
    };

    let mut entry = Entry::new(
        entry_path.to_owned(),
        meta,
        Some(format),
        Content::Pending(reader),
        &mut *policy,
        config,
    );
    if handler(&mut entry)? == Visit::Skip {
        log::trace!("handler skipped {entry_path}");
        return Ok(());
    }
    if !entry.policy().extracted(entry_path) {
        return Ok(());
    }
    let Some(spill) = entry.into_spill()? else {
        return Ok(());
    };

    log::debug!(
        "descending into {entry_path} ({format}, {})",
        if spill.is_on_disk() { "disk" } else { "memory" }
    );
    let mut nested = ArchiveFile::nested(
        &meta.name,
        hosts.to_vec(),
        Box::new(spill),
        policy,
        config.clone(),
    );
    walk(&mut nested, handler)
}

/// Attaches `path` to an error unless it already names its origin.
fn tag(path: &str, err: ArchiveError) -> ArchiveError {
    match err {
        ArchiveError::Entry { .. } | ArchiveError::Joined(_) | ArchiveError::Cancelled => err,
        other => ArchiveError::at(path, other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_tar;
    use crate::test_utils::create_test_zip;
    use crate::test_utils::gzip;
    use crate::test_utils::TarTestBuilder;
    use std::io::Cursor;

    fn paths(file: &mut ArchiveFile<'_>) -> Vec<(String, Option<String>)> {
        let mut seen = Vec::new();
        file.extract(|entry| {
            let format = entry.archived().map(|f| f.to_string());
            seen.push((entry.path().to_owned(), format));
            Ok(Visit::Continue)
        })
        .unwrap();
        seen
    }

    #[test]
    fn test_flat_walk_reports_archived_entries() {
        let inner = create_test_zip(vec![("y.txt", b"inner")]);
        let outer = create_test_zip(vec![("x.txt", b"hello"), ("b.zip", &inner)]);
        let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();

        assert_eq!(
            paths(&mut file),
            vec![
                ("a.zip/x.txt".to_owned(), None),
                ("a.zip/b.zip".to_owned(), Some("zip".to_owned())),
            ]
        );
    }

    #[test]
    fn test_descends_into_flagged_archives() {
        let inner = create_test_zip(vec![("y.txt", b"inner")]);
        let outer = create_test_zip(vec![("dir/b.zip", &inner)]);
        let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();
        file.extracted_entry("a.zip/dir/b.zip").unwrap();

        let found = paths(&mut file);
        assert_eq!(found[1].0, "a.zip/dir/b.zip/y.txt");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_skip_prevents_descent() {
        let inner = create_test_zip(vec![("y.txt", b"inner")]);
        let outer = create_test_zip(vec![("b.zip", &inner)]);
        let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();
        file.extracted_entry("a.zip/b.zip").unwrap();

        let mut seen = Vec::new();
        file.extract(|entry| {
            seen.push(entry.path().to_owned());
            Ok(Visit::Skip)
        })
        .unwrap();
        assert_eq!(seen, vec!["a.zip/b.zip"]);
    }

    #[test]
    fn test_nested_tar_is_not_sniffed() {
        let inner = create_test_tar(vec![("y.txt", b"inner")]);
        let outer = create_test_zip(vec![("b.tar", &inner)]);
        let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();
        file.extracted_entry("a.zip/b.tar").unwrap();

        assert_eq!(paths(&mut file), vec![("a.zip/b.tar".to_owned(), None)]);
    }

    #[test]
    fn test_empty_files_and_directories() {
        let data = TarTestBuilder::new()
            .add_directory("dir/")
            .add_file("dir/empty.txt", b"")
            .build();
        let mut file = ArchiveFile::new("a.tar", Cursor::new(data)).unwrap();

        let mut seen = Vec::new();
        file.extract(|entry| {
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;
            seen.push((entry.path().to_owned(), entry.is_dir(), buf.len()));
            Ok(Visit::Continue)
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![
                ("a.tar/dir".to_owned(), true, 0),
                ("a.tar/dir/empty.txt".to_owned(), false, 0),
            ]
        );
    }

    #[test]
    fn test_gzip_single_entry_into_archive() {
        let tar = create_test_tar(vec![("deep.txt", b"deep")]);
        let outer = create_test_zip(vec![("pack.tar.gz", &gzip(&tar))]);
        let mut file = ArchiveFile::new("a.zip", Cursor::new(outer)).unwrap();
        file.extracted_entry("a.zip/pack.tar.gz").unwrap();

        let found = paths(&mut file);
        assert_eq!(found[1].0, "a.zip/pack.tar.gz/deep.txt");
    }

    #[test]
    fn test_handler_error_is_tagged() {
        let data = create_test_zip(vec![("x.txt", b"hello")]);
        let mut file = ArchiveFile::new("a.zip", Cursor::new(data)).unwrap();
        let err = file
            .extract(|_| Err(ArchiveError::InvalidArchive("boom".into())))
            .unwrap_err();
        assert_eq!(err.context(), Some("a.zip/x.txt"));
    }

    #[test]
    fn test_unrecognized_root_is_tagged() {
        let mut file = ArchiveFile::new("x.bin", Cursor::new(b"0123456789".to_vec())).unwrap();
        let err = file.extract(|_| Ok(Visit::Continue)).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ArchiveError::UnrecognizedFormat { .. }
        ));
        assert_eq!(err.context(), Some("x.bin"));
    }

    #[test]
    fn test_tag_keeps_existing_origin() {
        let tagged = tag("a.zip", ArchiveError::at("a.zip/b.7z", ArchiveError::PasswordRequired));
        assert_eq!(tagged.context(), Some("a.zip/b.7z"));
        assert!(matches!(tag("a", ArchiveError::Cancelled), ArchiveError::Cancelled));
    }
}

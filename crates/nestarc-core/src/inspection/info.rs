//! Builds an [`InfoTree`] by walking an archive and every nested archive the
//! policy lets it open.

use std::io::Read;

use glob::Pattern;

use crate::Result;
use crate::archive::ArchiveFile;
use crate::error::ArchiveError;
use crate::extraction::entry::Entry;
use crate::extraction::entry::Visit;
use crate::inspection::tree::InfoTree;
use crate::inspection::tree::MATCH_OPTIONS;
use crate::inspection::tree::compile_pattern;
use crate::policy::PolicyTree;

pub(crate) fn build(file: &mut ArchiveFile<'_>, previews: &[&str]) -> (InfoTree, Result<()>) {
    let root = file.path();

    let patterns = match previews
        .iter()
        .map(|pattern| compile_pattern(pattern))
        .collect::<Result<Vec<_>>>()
    {
        Ok(patterns) => patterns,
        Err(err) => return (InfoTree::new(file.name(), false, ""), Err(err)),
    };

    let encrypted = match file.encrypted() {
        Ok(encrypted) => encrypted,
        Err(err) => {
            return (
                InfoTree::new(file.name(), false, ""),
                Err(ArchiveError::at(root, err)),
            );
        }
    };
    let password = if encrypted {
        file.policy().password(&root).to_owned()
    } else {
        String::new()
    };

    let mut tree = InfoTree::new(file.name(), encrypted, password);
    let walked = file.extract(|entry| mount(&mut tree, &patterns, entry));

    let failures = failures(&tree, file.policy());
    log::debug!(
        "info {root}: {} nodes, {} password failures",
        tree.len(),
        failures.len()
    );
    let err = failures
        .into_iter()
        .fold(walked.err(), |acc, failure| {
            Some(ArchiveError::join_opt(acc, failure))
        });
    (tree, err.map_or(Ok(()), Err))
}

fn mount(tree: &mut InfoTree, patterns: &[Pattern], entry: &mut Entry<'_>) -> Result<Visit> {
    let path = entry.path().to_owned();
    if entry.is_dir() {
        tree.mount_dir(&path);
        return Ok(Visit::Continue);
    }

    match entry.probe() {
        Ok(Some(probe)) => {
            tree.mount_archive_file(
                &path,
                probe.encrypted,
                probe.password_invalid,
                &probe.password,
            );
            if probe.password_invalid {
                return Ok(Visit::Skip);
            }
            entry.mark_extracted()?;
            return Ok(Visit::Continue);
        }
        Ok(None) => {}
        Err(err) if err.is_malformed() => {
            log::warn!("cannot open nested archive {path}: {err}");
            tree.mount_archive_file(&path, false, false, "");
            return Ok(Visit::Skip);
        }
        Err(err) => return Err(err),
    }

    let preview = if patterns
        .iter()
        .any(|pattern| pattern.matches_with(&path, MATCH_OPTIONS))
    {
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Some(data)
    } else {
        None
    };
    tree.mount_file(&path, preview);
    Ok(Visit::Continue)
}

/// One error per nested archive left locked: required when no password was
/// set for it, invalid when the one set for it failed.
fn failures(tree: &InfoTree, policy: &PolicyTree) -> Vec<ArchiveError> {
    tree.invalid_archived_entries()
        .into_iter()
        .map(|index| {
            let path = tree.path(index);
            let cause = if policy.own_password(&path).is_some_and(|pw| !pw.is_empty()) {
                ArchiveError::PasswordInvalid
            } else {
                ArchiveError::PasswordRequired
            };
            ArchiveError::at(path, cause)
        })
        .collect()
}

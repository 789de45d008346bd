//! Subcommand implementations.

pub mod completion;
pub mod extract;
pub mod info;
pub mod validate;

use crate::cli::PolicyArgs;
use crate::error::add_archive_context;
use anyhow::Context;
use anyhow::Result;
use nestarc_core::ArchiveFile;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Opens `archive` from disk and applies the policy flags.
pub fn open_archive(archive: &Path, policy: &PolicyArgs) -> Result<ArchiveFile<'static>> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive '{}'", archive.display()))?;
    let display = archive.to_string_lossy();
    let mut archive_file =
        add_archive_context(ArchiveFile::new(&display, BufReader::new(file)), archive)?;

    if let Some(password) = &policy.password {
        add_archive_context(archive_file.set_password(password), archive)?;
    }
    for (path, password) in &policy.entry_passwords {
        add_archive_context(archive_file.set_entry_password(path, password), archive)?;
    }
    for path in &policy.discard {
        add_archive_context(archive_file.discard_entry(path), archive)?;
    }
    log::debug!(
        "opened {} as {}",
        archive.display(),
        archive_file.path()
    );
    Ok(archive_file)
}

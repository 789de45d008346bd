//! Error conversion utilities for CLI.
//!
//! Converts nestarc-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use nestarc_core::ArchiveError;
use nestarc_core::password_failures;
use std::path::Path;

/// Converts `ArchiveError` to user-friendly anyhow error with context
pub fn convert_archive_error(err: ArchiveError, archive: &Path) -> anyhow::Error {
    if let Some(failures) = password_failures(&err) {
        let listed = failures
            .iter()
            .map(|failure| format!("  {failure}"))
            .collect::<Vec<_>>()
            .join("\n");
        return anyhow!(
            "Missing or wrong passwords in '{}':\n{listed}\n\
             HINT: Use --password for the archive itself or --entry-password PATH=PASSWORD \
             for a nested archive.",
            archive.display()
        );
    }

    let location = match &err {
        ArchiveError::Entry { path, .. } => Some(path.clone()),
        _ => None,
    };
    match err.root_cause() {
        ArchiveError::PasswordRequired => anyhow!(
            "Archive '{}' is encrypted\n\
             HINT: Use --password to supply its password.",
            archive.display()
        ),
        ArchiveError::PasswordInvalid => anyhow!(
            "Wrong password for '{}'\n\
             HINT: Check the value given with --password.",
            archive.display()
        ),
        ArchiveError::UnrecognizedFormat { .. } => anyhow!(
            "Not a recognized archive: {}\n\
             HINT: Supported formats: zip, 7z, rar, tar, tar.gz, tar.bz2, gz, bz2",
            archive.display()
        ),
        ArchiveError::PasswordUnsupported { format, .. } => anyhow!(
            "A password was given for a {format} archive in '{}'\n\
             HINT: Only zip, 7z and rar archives can be encrypted.",
            archive.display()
        ),
        ArchiveError::InvalidArchive(reason) => anyhow!(
            "Invalid archive '{}'{}: {reason}\n\
             HINT: The archive may be corrupted or malformed.",
            archive.display(),
            at(location.as_deref())
        ),
        ArchiveError::ShortRead { path, .. } => anyhow!(
            "Truncated entry {path} in '{}'\n\
             HINT: The archive may be corrupted or incomplete.",
            archive.display()
        ),
        ArchiveError::PolicyPath { path, root } => anyhow!(
            "Path '{path}' does not belong to '{root}'\n\
             HINT: Logical paths start with the archive name, e.g. {root}/dir/nested.zip"
        ),
        ArchiveError::InvalidPattern { pattern, reason } => anyhow!(
            "Invalid preview pattern '{pattern}': {reason}\n\
             HINT: Use glob syntax; '*' does not match '/', '**' matches any depth."
        ),
        ArchiveError::Cancelled => anyhow!("Cancelled while processing '{}'", archive.display()),
        ArchiveError::Io(io_err) => anyhow!(
            "I/O error while processing '{}'{}: {io_err}",
            archive.display(),
            at(location.as_deref())
        ),
        _ => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

fn at(location: Option<&str>) -> String {
    location.map_or_else(String::new, |path| format!(" at {path}"))
}

/// Adds context to a generic error about archive operations
pub fn add_archive_context<T>(
    result: Result<T, ArchiveError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, archive))
}

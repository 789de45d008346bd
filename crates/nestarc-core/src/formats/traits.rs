//! Common traits for archive format readers.

use std::io;
use std::io::Read;

use crate::Result;
use crate::error::ArchiveError;
use crate::formats::ArchiveFormat;

/// Metadata of one entry as reported by its archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Name inside the archive, as stored (may contain `/`).
    pub name: String,
    /// Declared uncompressed size, if the format records one.
    pub size: Option<u64>,
    /// Entry is a directory.
    pub is_dir: bool,
    /// Entry is flagged as encrypted by the container.
    pub encrypted: bool,
    /// Format of the archive containing the entry.
    pub format: ArchiveFormat,
}

/// Callback invoked for every entry, in archive order.
///
/// The reader is positioned at the start of the entry's content and is only
/// valid for the duration of the call. Errors returned by the visitor stop the
/// iteration and are passed through unchanged.
pub type EntryVisitor<'v> = dyn FnMut(&EntryMeta, &mut dyn Read) -> Result<()> + 'v;

/// Trait for archive format readers.
pub trait FormatReader {
    /// Returns the archive format.
    fn format(&self) -> ArchiveFormat;

    /// Iterates every entry in archive order.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be decoded, an entry cannot be
    /// opened (including password failures) or the visitor fails.
    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()>;
}

/// Reader over decrypted entry content.
///
/// A decoding failure inside an encrypted entry almost always means the key
/// was wrong, so read errors are reported as password failures. The
/// `ArchiveError` travels inside the `io::Error` and is recovered by
/// `From<io::Error> for ArchiveError`.
pub(crate) struct DecryptedContent<R> {
    inner: R,
    password_supplied: bool,
}

impl<R: Read> DecryptedContent<R> {
    pub(crate) fn new(inner: R, password: &str) -> Self {
        Self {
            inner,
            password_supplied: !password.is_empty(),
        }
    }
}

impl<R: Read> Read for DecryptedContent<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|err| {
            log::debug!("decoding encrypted entry failed: {err}");
            let failure = if self.password_supplied {
                ArchiveError::PasswordInvalid
            } else {
                ArchiveError::PasswordRequired
            };
            io::Error::other(failure)
        })
    }
}

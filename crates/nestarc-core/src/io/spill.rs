//! Seekable copies of nested archive entries.
//!
//! Archive decoders need random access, but entry readers are forward-only.
//! Before descending into a nested archive the walker copies the entry into a
//! [`Spill`]: a memory buffer for small entries, a file in a private temporary
//! directory for large ones, and a spooled file when the size is unknown.
//! Dropping the spill removes every temporary resource it created.

use std::fs::File;
use std::io;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;

use tempfile::SpooledTempFile;
use tempfile::TempDir;

use crate::config::SPILL_THRESHOLD;
use crate::config::TraversalConfig;
use crate::error::ArchiveError;
use crate::error::Result;
use crate::path;

/// Prefix of the temporary directories created for disk spills.
pub const TEMP_DIR_PREFIX: &str = "nestarc_archives_";

/// Where an entry of a given declared size is spilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpillTarget {
    /// Declared size below [`SPILL_THRESHOLD`].
    Memory,
    /// Declared size at or above [`SPILL_THRESHOLD`].
    Disk,
    /// Size unknown; buffered in memory and rolled over to disk when large.
    Spooled,
}

impl SpillTarget {
    /// Chooses the spill target for a declared entry size.
    ///
    /// # Examples
    ///
    /// ```
    /// use nestarc_core::SPILL_THRESHOLD;
    /// use nestarc_core::io::SpillTarget;
    ///
    /// assert_eq!(SpillTarget::for_size(Some(SPILL_THRESHOLD - 1)), SpillTarget::Memory);
    /// assert_eq!(SpillTarget::for_size(Some(SPILL_THRESHOLD)), SpillTarget::Disk);
    /// assert_eq!(SpillTarget::for_size(None), SpillTarget::Spooled);
    /// ```
    pub fn for_size(size: Option<u64>) -> Self {
        match size {
            Some(size) if size < SPILL_THRESHOLD => Self::Memory,
            Some(_) => Self::Disk,
            None => Self::Spooled,
        }
    }
}

/// Seekable copy of one entry.
#[derive(Debug)]
pub enum Spill {
    /// Entry held in memory.
    Memory(Cursor<Vec<u8>>),
    /// Entry copied into a file inside its own temporary directory.
    Disk {
        // Declared before the directory so the handle closes first on drop.
        /// Open handle to the copy.
        file: File,
        /// Directory removed when the spill is dropped.
        dir: TempDir,
    },
    /// Entry of unknown size.
    Spooled(SpooledTempFile),
}

impl Spill {
    /// Copies `reader` into a new spill chosen by `size`.
    ///
    /// `entry_path` is the logical path of the entry, used for error messages
    /// and to name the temporary file. When `size` is known the number of
    /// bytes copied must match it exactly.
    pub fn fill<R: Read + ?Sized>(
        reader: &mut R,
        size: Option<u64>,
        entry_path: &str,
        config: &TraversalConfig,
    ) -> Result<Self> {
        Self::fill_as(SpillTarget::for_size(size), reader, size, entry_path, config)
    }

    pub(crate) fn fill_as<R: Read + ?Sized>(
        target: SpillTarget,
        reader: &mut R,
        size: Option<u64>,
        entry_path: &str,
        config: &TraversalConfig,
    ) -> Result<Self> {
        log::debug!("spilling {entry_path} to {target:?} (declared size {size:?})");

        let (mut spill, copied) = match target {
            SpillTarget::Memory => {
                let capacity = size.and_then(|s| usize::try_from(s).ok()).unwrap_or(0);
                let mut buf = Vec::with_capacity(capacity);
                let copied = io::copy(reader, &mut buf)?;
                (Self::Memory(Cursor::new(buf)), copied)
            }
            SpillTarget::Disk => {
                let parent = config.spill_dir();
                let dir = tempfile::Builder::new()
                    .prefix(TEMP_DIR_PREFIX)
                    .tempdir_in(&parent)
                    .map_err(|source| ArchiveError::TempResource {
                        path: parent.clone(),
                        source,
                    })?;
                let name = match path::base_name(entry_path) {
                    "" => "entry",
                    name => name,
                };
                let file_path = dir.path().join(name);
                let mut file = File::options()
                    .read(true)
                    .write(true)
                    .create_new(true)
                    .open(&file_path)
                    .map_err(|source| ArchiveError::TempResource {
                        path: file_path.clone(),
                        source,
                    })?;
                let copied = io::copy(reader, &mut file).map_err(|source| {
                    ArchiveError::TempResource {
                        path: file_path.clone(),
                        source,
                    }
                })?;
                (Self::Disk { file, dir }, copied)
            }
            SpillTarget::Spooled => {
                let max = usize::try_from(SPILL_THRESHOLD).unwrap_or(usize::MAX);
                let mut spooled = SpooledTempFile::new(max);
                let copied = io::copy(reader, &mut spooled)?;
                (Self::Spooled(spooled), copied)
            }
        };

        if let Some(expected) = size
            && expected != copied
        {
            return Err(ArchiveError::ShortRead {
                path: entry_path.to_owned(),
                expected,
                actual: copied,
            });
        }

        spill.rewind()?;
        Ok(spill)
    }

    /// Returns `true` if the spill lives on disk.
    pub fn is_on_disk(&self) -> bool {
        match self {
            Self::Memory(_) => false,
            Self::Disk { .. } => true,
            Self::Spooled(spooled) => spooled.is_rolled(),
        }
    }

    /// Returns the temporary directory backing a disk spill.
    pub fn temp_dir(&self) -> Option<&std::path::Path> {
        match self {
            Self::Disk { dir, .. } => Some(dir.path()),
            _ => None,
        }
    }
}

impl Read for Spill {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Memory(cursor) => cursor.read(buf),
            Self::Disk { file, .. } => file.read(buf),
            Self::Spooled(spooled) => spooled.read(buf),
        }
    }
}

impl Seek for Spill {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Memory(cursor) => cursor.seek(pos),
            Self::Disk { file, .. } => file.seek(pos),
            Self::Spooled(spooled) => spooled.seek(pos),
        }
    }
}

//! RAR reader backed by the unrar library.
//!
//! unrar only opens archives by path, so the source is first copied into a
//! named temporary file. Entries below the spill threshold are decoded into
//! memory; larger ones and those of unknown size are extracted into a private
//! temporary directory and read back from disk.

use std::fs::File;
use std::io;
use std::io::Cursor;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tempfile::TempDir;
use unrar::error::Code;
use unrar::error::UnrarError;

use crate::Result;
use crate::config::SPILL_THRESHOLD;
use crate::config::TraversalConfig;
use crate::error::ArchiveError;
use crate::formats::ArchiveFormat;
use crate::formats::traits::EntryMeta;
use crate::formats::traits::EntryVisitor;
use crate::formats::traits::FormatReader;
use crate::io::Source;
use crate::io::spill::TEMP_DIR_PREFIX;

/// RAR archive reader (v4 and v5).
pub struct RarReader {
    file: NamedTempFile,
    password: String,
    staging: PathBuf,
    /// Entries of a known size below this are decoded into memory.
    memory_limit: u64,
}

impl RarReader {
    /// Copies `source` into a temporary file and rewinds it.
    pub fn new(source: &mut dyn Source, password: &str, config: &TraversalConfig) -> Result<Self> {
        let dir = config.spill_dir();
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .suffix(".rar")
            .tempfile_in(&dir)
            .map_err(|source| ArchiveError::TempResource {
                path: dir.clone(),
                source,
            })?;

        source.rewind()?;
        io::copy(source, file.as_file_mut()).map_err(|source| ArchiveError::TempResource {
            path: dir,
            source,
        })?;
        source.rewind()?;

        Ok(Self {
            file,
            password: password.to_owned(),
            staging: config.spill_dir(),
            memory_limit: SPILL_THRESHOLD,
        })
    }

    /// Returns `true` if an entry of `size` is decoded into memory.
    fn in_memory(&self, size: Option<u64>) -> bool {
        size.is_some_and(|size| size < self.memory_limit)
    }

    fn staging_dir(&self) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(&self.staging)
            .map_err(|source| ArchiveError::TempResource {
                path: self.staging.clone(),
                source,
            })
    }

    fn open(&self) -> Result<unrar::OpenArchive<unrar::Process, unrar::CursorBeforeHeader>> {
        let path = self.file.path();
        let archive = if self.password.is_empty() {
            unrar::Archive::new(path)
        } else {
            unrar::Archive::with_password(path, self.password.as_bytes())
        };
        archive
            .open_for_processing()
            .map_err(|e| map_rar_error(&e, &self.password, false))
    }
}

impl FormatReader for RarReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Rar
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        let mut cursor = self.open()?;
        while let Some(header) = cursor
            .read_header()
            .map_err(|e| map_rar_error(&e, &self.password, false))?
        {
            let entry = header.entry();
            let meta = EntryMeta {
                name: entry.filename.to_string_lossy().replace('\\', "/"),
                size: u64::try_from(entry.unpacked_size).ok(),
                is_dir: entry.is_directory(),
                encrypted: entry.is_encrypted(),
                format: ArchiveFormat::Rar,
            };

            cursor = if meta.is_dir {
                visit(&meta, &mut io::empty())?;
                header
                    .skip()
                    .map_err(|e| map_rar_error(&e, &self.password, meta.encrypted))?
            } else if self.in_memory(meta.size) {
                let (data, rest) = header
                    .read()
                    .map_err(|e| map_rar_error(&e, &self.password, meta.encrypted))?;
                visit(&meta, &mut Cursor::new(data))?;
                rest
            } else {
                let dir = self.staging_dir()?;
                let target = dir.path().join("entry");
                log::debug!("staging rar entry {} on disk", meta.name);
                let rest = header
                    .extract_to(&target)
                    .map_err(|e| map_rar_error(&e, &self.password, meta.encrypted))?;
                let mut staged =
                    File::open(&target).map_err(|source| ArchiveError::TempResource {
                        path: target.clone(),
                        source,
                    })?;
                visit(&meta, &mut staged)?;
                rest
            };
        }
        Ok(())
    }
}

/// Maps unrar errors. Corrupt data inside an encrypted entry means the key
/// was wrong.
fn map_rar_error(err: &UnrarError, password: &str, encrypted: bool) -> ArchiveError {
    let password_failure = matches!(err.code, Code::MissingPassword | Code::BadPassword)
        || (encrypted && matches!(err.code, Code::BadData));
    if !password_failure {
        return ArchiveError::InvalidArchive(format!("rar: {err}"));
    }
    if password.is_empty() {
        ArchiveError::PasswordRequired
    } else {
        ArchiveError::PasswordInvalid
    }
}

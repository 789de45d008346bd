//! ZIP reader with per-entry password injection.

use zip::ZipArchive;
use zip::result::ZipError;

use crate::Result;
use crate::error::ArchiveError;
use crate::formats::ArchiveFormat;
use crate::formats::traits::DecryptedContent;
use crate::formats::traits::EntryMeta;
use crate::formats::traits::EntryVisitor;
use crate::formats::traits::FormatReader;
use crate::io::Source;

/// ZIP archive reader.
///
/// When a password is set it is applied to every entry flagged as encrypted
/// (ZipCrypto or AES); plain entries are opened normally.
pub struct ZipReader<'s> {
    archive: ZipArchive<&'s mut dyn Source>,
    password: String,
}

impl<'s> ZipReader<'s> {
    /// Opens the central directory of `source`.
    pub fn new(source: &'s mut dyn Source, password: &str) -> Result<Self> {
        let archive = ZipArchive::new(source).map_err(|e| map_zip_error(e, password))?;
        Ok(Self {
            archive,
            password: password.to_owned(),
        })
    }
}

impl FormatReader for ZipReader<'_> {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        for index in 0..self.archive.len() {
            let meta = {
                let raw = self
                    .archive
                    .by_index_raw(index)
                    .map_err(|e| map_zip_error(e, &self.password))?;
                EntryMeta {
                    name: raw.name().to_owned(),
                    size: Some(raw.size()),
                    is_dir: raw.is_dir(),
                    encrypted: raw.encrypted(),
                    format: ArchiveFormat::Zip,
                }
            };

            let opened = if meta.encrypted && !self.password.is_empty() {
                self.archive
                    .by_index_decrypt(index, self.password.as_bytes())
            } else {
                self.archive.by_index(index)
            };
            let mut file = opened.map_err(|e| map_zip_error(e, &self.password))?;
            if meta.encrypted {
                visit(&meta, &mut DecryptedContent::new(&mut file, &self.password))?;
            } else {
                visit(&meta, &mut file)?;
            }
        }
        Ok(())
    }
}

/// Maps zip errors, telling a missing password from a wrong one.
fn map_zip_error(err: ZipError, password: &str) -> ArchiveError {
    let password_failure = || {
        if password.is_empty() {
            ArchiveError::PasswordRequired
        } else {
            ArchiveError::PasswordInvalid
        }
    };
    match err {
        ZipError::UnsupportedArchive(detail) if detail == ZipError::PASSWORD_REQUIRED => {
            password_failure()
        }
        ZipError::InvalidPassword => password_failure(),
        ZipError::Io(io) => io.into(),
        other => ArchiveError::InvalidArchive(format!("zip: {other}")),
    }
}

//! 7z reader with archive-wide password support.
//!
//! 7z encrypts whole blocks (and optionally the header) with AES-256. The
//! password is therefore set once on the reader rather than per entry.
//!
//! Entries of a solid block share one decoder, so whatever a visitor leaves
//! unread is drained before the next entry starts.

use std::io;
use std::io::Read;

use sevenz_rust2::ArchiveReader;
use sevenz_rust2::EncoderMethod;
use sevenz_rust2::Password;

use crate::Result;
use crate::error::ArchiveError;
use crate::formats::ArchiveFormat;
use crate::formats::traits::DecryptedContent;
use crate::formats::traits::EntryMeta;
use crate::formats::traits::EntryVisitor;
use crate::formats::traits::FormatReader;
use crate::io::Source;

/// 7z archive reader.
pub struct SevenZReader<'s> {
    reader: ArchiveReader<&'s mut dyn Source>,
    password: String,
    encrypted: bool,
}

impl<'s> SevenZReader<'s> {
    /// Reads the archive header of `source`.
    ///
    /// An encrypted header cannot be read without the right password, so
    /// password failures may already surface here.
    pub fn new(source: &'s mut dyn Source, password: &str) -> Result<Self> {
        let key = if password.is_empty() {
            Password::empty()
        } else {
            Password::from(password)
        };
        let reader =
            ArchiveReader::new(source, key).map_err(|e| classify(&e, password, false))?;
        let encrypted = has_encrypted_blocks(reader.archive());
        Ok(Self {
            reader,
            password: password.to_owned(),
            encrypted,
        })
    }

    /// Returns `true` if any block is AES encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }
}

fn has_encrypted_blocks(archive: &sevenz_rust2::Archive) -> bool {
    archive.blocks.iter().any(|block| {
        block
            .coders
            .iter()
            .any(|coder| coder.encoder_method_id() == EncoderMethod::ID_AES256_SHA256)
    })
}

/// Maps a sevenz-rust2 error. Besides its password variants the library may
/// surface a wrong key as a corrupt stream, so messages are checked as well.
fn classify(err: &sevenz_rust2::Error, password: &str, encrypted: bool) -> ArchiveError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    let password_variant = matches!(
        err,
        sevenz_rust2::Error::PasswordRequired | sevenz_rust2::Error::MaybeBadPassword(_)
    );
    if password_variant || encrypted || lower.contains("password") || lower.contains("encrypt") {
        if password.is_empty() {
            return ArchiveError::PasswordRequired;
        }
        return ArchiveError::PasswordInvalid;
    }
    ArchiveError::InvalidArchive(format!("7z: {message}"))
}

impl FormatReader for SevenZReader<'_> {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::SevenZ
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        let encrypted = self.encrypted;
        let password = self.password.as_str();
        let mut failure: Option<ArchiveError> = None;

        let result = self.reader.for_each_entries(|entry, content| {
            let meta = EntryMeta {
                name: entry.name.clone(),
                size: Some(entry.size),
                is_dir: entry.is_directory(),
                encrypted,
                format: ArchiveFormat::SevenZ,
            };
            let visited = if encrypted {
                let mut content = DecryptedContent::new(content, password);
                visit(&meta, &mut content).and_then(|()| drain(&mut content))
            } else {
                visit(&meta, &mut *content).and_then(|()| drain(content))
            };
            match visited {
                Ok(()) => Ok(true),
                Err(err) => {
                    failure = Some(err);
                    Err(sevenz_rust2::Error::Other("entry visit aborted".into()))
                }
            }
        });

        match (failure, result) {
            (Some(err), _) => Err(err),
            (None, Err(err)) => Err(classify(&err, password, encrypted)),
            (None, Ok(())) => Ok(()),
        }
    }
}

/// Consumes what the visitor left of an entry.
fn drain(content: &mut dyn Read) -> Result<()> {
    io::copy(content, &mut io::sink())?;
    Ok(())
}

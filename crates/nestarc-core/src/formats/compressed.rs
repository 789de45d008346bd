//! Gzip and bzip2 streams.
//!
//! A compressed stream either wraps a tar archive (`.tar.gz`, `.tbz2`) or a
//! single file. The first block of the decompressed payload decides which:
//! a POSIX tar header makes the stream iterate as tar, anything else is
//! exposed as one entry named after the source with its suffix removed.

use std::io::Read;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;

use crate::Result;
use crate::error::ArchiveError;
use crate::formats::ArchiveFormat;
use crate::formats::detect::is_ustar;
use crate::formats::tar::TarReader;
use crate::formats::traits::EntryMeta;
use crate::formats::traits::EntryVisitor;
use crate::formats::traits::FormatReader;
use crate::io::CompositeReader;
use crate::io::Source;
use crate::path;

/// Bytes of payload inspected for a tar header.
const TAR_BLOCK: u64 = 512;

/// Fallback entry name when the source name carries nothing usable.
const DEFAULT_ENTRY_NAME: &str = "data";

type Payload<'s> = CompositeReader<Box<dyn Read + 's>>;

enum Contents<'s> {
    Tar(TarReader<Payload<'s>>),
    Single { name: String, payload: Payload<'s> },
}

/// Reader over a gzip or bzip2 compressed source.
pub struct CompressedReader<'s> {
    format: ArchiveFormat,
    contents: Contents<'s>,
}

impl<'s> CompressedReader<'s> {
    /// Starts decompressing `source` and inspects the first payload block.
    ///
    /// `format` must be [`ArchiveFormat::Gzip`] or [`ArchiveFormat::Bzip2`].
    pub fn new(name: &str, source: &'s mut dyn Source, format: ArchiveFormat) -> Result<Self> {
        let mut decoder: Box<dyn Read + 's> = match format {
            ArchiveFormat::Gzip => Box::new(MultiGzDecoder::new(source)),
            ArchiveFormat::Bzip2 => Box::new(MultiBzDecoder::new(source)),
            other => {
                return Err(ArchiveError::InvalidArchive(format!(
                    "{other} is not a compressed stream"
                )));
            }
        };

        let mut head = Vec::with_capacity(TAR_BLOCK as usize);
        (&mut decoder)
            .take(TAR_BLOCK)
            .read_to_end(&mut head)
            .map_err(|e| decode_error(format, e))?;

        let is_tar = is_ustar(&head);
        let payload = CompositeReader::new(head, decoder);
        let contents = if is_tar {
            log::debug!("{name}: {format} stream wraps a tar archive");
            Contents::Tar(TarReader::reported_as(payload, format))
        } else {
            Contents::Single {
                name: single_entry_name(name, format),
                payload,
            }
        };
        Ok(Self { format, contents })
    }

    /// Returns `true` if the payload is a tar archive.
    pub fn is_tar(&self) -> bool {
        matches!(self.contents, Contents::Tar(_))
    }
}

impl FormatReader for CompressedReader<'_> {
    fn format(&self) -> ArchiveFormat {
        self.format
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        match &mut self.contents {
            Contents::Tar(tar) => tar.for_each_entry(visit),
            Contents::Single { name, payload } => {
                let meta = EntryMeta {
                    name: name.clone(),
                    size: None,
                    is_dir: false,
                    encrypted: false,
                    format: self.format,
                };
                visit(&meta, payload)
            }
        }
    }
}

fn decode_error(format: ArchiveFormat, err: std::io::Error) -> ArchiveError {
    ArchiveError::InvalidArchive(format!("{format}: {err}"))
}

/// Derives the name of the single decompressed entry.
///
/// `notes.txt.gz` becomes `notes.txt` and `bundle.tgz` becomes `bundle.tar`.
pub(crate) fn single_entry_name(source_name: &str, format: ArchiveFormat) -> String {
    let base = path::base_name(source_name);
    let lower = base.to_ascii_lowercase();
    let suffixes: &[(&str, &str)] = match format {
        ArchiveFormat::Gzip => &[(".gz", ""), (".gzip", ""), (".tgz", ".tar")],
        ArchiveFormat::Bzip2 => &[
            (".tbz2", ".tar"),
            (".tbz", ".tar"),
            (".bz2", ""),
            (".bzip2", ""),
        ],
        _ => &[],
    };

    let stripped = suffixes.iter().find_map(|(suffix, replacement)| {
        lower
            .ends_with(suffix)
            .then(|| format!("{}{replacement}", &base[..base.len() - suffix.len()]))
    });
    match stripped.as_deref().unwrap_or(base) {
        "" => DEFAULT_ENTRY_NAME.to_owned(),
        name => name.to_owned(),
    }
}

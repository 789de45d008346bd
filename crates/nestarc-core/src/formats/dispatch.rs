//! Password-aware extractor construction.

use crate::Result;
use crate::config::TraversalConfig;
use crate::error::ArchiveError;
use crate::formats::ArchiveFormat;
use crate::formats::compressed::CompressedReader;
use crate::formats::detect;
use crate::formats::sevenz::SevenZReader;
use crate::formats::tar::TarReader;
use crate::formats::traits::EntryVisitor;
use crate::formats::traits::FormatReader;
use crate::formats::zip::ZipReader;
use crate::io::Source;

#[cfg(feature = "rar")]
use crate::formats::rar::RarReader;

/// Extractor for one archive level, built by [`identify`].
pub enum Extractor<'s> {
    /// ZIP archive.
    Zip(ZipReader<'s>),
    /// 7z archive.
    SevenZ(SevenZReader<'s>),
    /// RAR archive.
    #[cfg(feature = "rar")]
    Rar(RarReader),
    /// Plain tar archive.
    Tar(TarReader<&'s mut dyn Source>),
    /// Gzip or bzip2 stream.
    Compressed(CompressedReader<'s>),
}

/// Identifies the format of `source` and builds its extractor.
///
/// A non-empty `password` is injected into zip, 7z and rar extractors.
/// Supplying one for any other format is an error, as is content that
/// matches no known signature.
///
/// # Examples
///
/// ```
/// use nestarc_core::formats::FormatReader;
/// use nestarc_core::formats::identify;
/// use nestarc_core::test_utils::create_test_zip;
/// use nestarc_core::{ArchiveFormat, TraversalConfig};
/// use std::io::Cursor;
///
/// let mut source = Cursor::new(create_test_zip(vec![("x.txt", b"hello")]));
/// let extractor = identify("a.zip", &mut source, "", &TraversalConfig::default())?;
/// assert_eq!(extractor.format(), ArchiveFormat::Zip);
/// # Ok::<(), nestarc_core::ArchiveError>(())
/// ```
pub fn identify<'s>(
    name: &str,
    source: &'s mut dyn Source,
    password: &str,
    config: &TraversalConfig,
) -> Result<Extractor<'s>> {
    let format = detect::identify(name, &mut *source)?;
    if !password.is_empty() && !format.supports_password() {
        return Err(ArchiveError::PasswordUnsupported {
            name: name.to_owned(),
            format: format.name(),
        });
    }

    let extractor = match format {
        ArchiveFormat::Zip => Extractor::Zip(ZipReader::new(source, password)?),
        ArchiveFormat::SevenZ => Extractor::SevenZ(SevenZReader::new(source, password)?),
        ArchiveFormat::Tar => Extractor::Tar(TarReader::new(source)),
        ArchiveFormat::Gzip | ArchiveFormat::Bzip2 => {
            Extractor::Compressed(CompressedReader::new(name, source, format)?)
        }
        #[cfg(feature = "rar")]
        ArchiveFormat::Rar => Extractor::Rar(RarReader::new(source, password, config)?),
        #[cfg(not(feature = "rar"))]
        ArchiveFormat::Rar => {
            let _ = config;
            return Err(ArchiveError::InvalidArchive(
                "rar: support not compiled in".to_owned(),
            ));
        }
    };
    Ok(extractor)
}

impl FormatReader for Extractor<'_> {
    fn format(&self) -> ArchiveFormat {
        match self {
            Self::Zip(reader) => reader.format(),
            Self::SevenZ(reader) => reader.format(),
            #[cfg(feature = "rar")]
            Self::Rar(reader) => reader.format(),
            Self::Tar(reader) => reader.format(),
            Self::Compressed(reader) => reader.format(),
        }
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        match self {
            Self::Zip(reader) => reader.for_each_entry(visit),
            Self::SevenZ(reader) => reader.for_each_entry(visit),
            #[cfg(feature = "rar")]
            Self::Rar(reader) => reader.for_each_entry(visit),
            Self::Tar(reader) => reader.for_each_entry(visit),
            Self::Compressed(reader) => reader.for_each_entry(visit),
        }
    }
}

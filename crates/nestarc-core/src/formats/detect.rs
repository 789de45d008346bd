//! Archive format detection by content.

use std::fmt;
use std::io::Read;
use std::io::Seek;

use crate::error::ArchiveError;
use crate::error::Result;
use crate::path;

/// Number of bytes compared against the signature table.
pub const SIGNATURE_LEN: usize = 8;

/// Offset of the POSIX `ustar` magic inside a tar header.
const USTAR_OFFSET: usize = 257;

const USTAR_MAGIC: &[u8] = b"ustar";

/// Archive formats the traversal can descend into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// ZIP archive, optionally with ZipCrypto or AES entries.
    Zip,
    /// Gzip stream, possibly wrapping a tar archive.
    Gzip,
    /// 7z archive, optionally AES encrypted.
    SevenZ,
    /// RAR archive (v4 or v5).
    Rar,
    /// Uncompressed tar archive.
    Tar,
    /// Bzip2 stream, possibly wrapping a tar archive.
    Bzip2,
}

/// Signature table, first match wins.
const SIGNATURES: &[(&[u8], ArchiveFormat)] = &[
    (&[0x50, 0x4B, 0x03, 0x04], ArchiveFormat::Zip),
    (&[0x1F, 0x8B, 0x08], ArchiveFormat::Gzip),
    (&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C], ArchiveFormat::SevenZ),
    (&[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00], ArchiveFormat::Rar),
    (
        &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x01, 0x00],
        ArchiveFormat::Rar,
    ),
    (USTAR_MAGIC, ArchiveFormat::Tar),
    (&[0x42, 0x5A, 0x68], ArchiveFormat::Bzip2),
];

impl ArchiveFormat {
    /// Returns the conventional extension-like name of the format.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Gzip => "gzip",
            Self::SevenZ => "7z",
            Self::Rar => "rar",
            Self::Tar => "tar",
            Self::Bzip2 => "bz2",
        }
    }

    /// Returns `true` if entries of this format can be password protected.
    pub const fn supports_password(self) -> bool {
        matches!(self, Self::Zip | Self::SevenZ | Self::Rar)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Matches the start of `head` against the signature table.
///
/// Only the first [`SIGNATURE_LEN`] bytes are considered. A signature longer
/// than the available bytes does not match.
///
/// # Examples
///
/// ```
/// use nestarc_core::formats::detect::sniff;
/// use nestarc_core::ArchiveFormat;
///
/// assert_eq!(sniff(b"PK\x03\x04rest"), Some(ArchiveFormat::Zip));
/// assert_eq!(sniff(b"hello world"), None);
/// assert_eq!(sniff(b""), None);
/// ```
pub fn sniff(head: &[u8]) -> Option<ArchiveFormat> {
    let head = &head[..head.len().min(SIGNATURE_LEN)];
    SIGNATURES
        .iter()
        .find(|(magic, _)| head.starts_with(magic))
        .map(|&(_, format)| format)
}

/// Reads up to [`SIGNATURE_LEN`] bytes from `reader` and sniffs them.
///
/// Read errors and empty input are reported as "not an archive".
pub fn sniff_reader<R: Read>(reader: R) -> Option<ArchiveFormat> {
    let mut head = Vec::with_capacity(SIGNATURE_LEN);
    reader
        .take(SIGNATURE_LEN as u64)
        .read_to_end(&mut head)
        .ok()?;
    sniff(&head)
}

/// Returns `true` if `block` starts with a POSIX tar header.
pub fn is_ustar(block: &[u8]) -> bool {
    block
        .get(USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len())
        .is_some_and(|magic| magic == USTAR_MAGIC)
}

/// Identifies the format of a top-level source.
///
/// Besides the signature table this recognizes tar archives by the `ustar`
/// magic at offset 257 and, as a last resort, by a `.tar` name hint. The
/// source is rewound before returning.
pub fn identify<R: Read + Seek + ?Sized>(name: &str, source: &mut R) -> Result<ArchiveFormat> {
    source.rewind()?;
    let mut block = Vec::with_capacity(512);
    (&mut *source).take(512).read_to_end(&mut block)?;
    source.rewind()?;

    let format = sniff(&block)
        .or_else(|| is_ustar(&block).then_some(ArchiveFormat::Tar))
        .or_else(|| {
            let looks_like_tar = path::base_name(name).to_ascii_lowercase().ends_with(".tar");
            (looks_like_tar && block.len() >= 512).then_some(ArchiveFormat::Tar)
        });

    match format {
        Some(format) => {
            log::debug!("identified {name} as {format}");
            Ok(format)
        }
        None => Err(ArchiveError::UnrecognizedFormat {
            name: name.to_owned(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(sniff(&[0x1F, 0x8B, 0x08, 0x00]), Some(ArchiveFormat::Gzip));
        assert_eq!(
            sniff(&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, 0x00, 0x04]),
            Some(ArchiveFormat::SevenZ)
        );
        assert_eq!(sniff(b"BZh91AY&SY"), Some(ArchiveFormat::Bzip2));
        assert_eq!(sniff(b"ustar\x0000"), Some(ArchiveFormat::Tar));
    }

    #[test]
    fn test_sniff_rar_versions() {
        assert_eq!(sniff(b"Rar!\x1A\x07\x00\xCF"), Some(ArchiveFormat::Rar));
        assert_eq!(sniff(b"Rar!\x1A\x07\x01\x00"), Some(ArchiveFormat::Rar));
        assert_eq!(sniff(b"Rar!\x1A\x07\x02\x00"), None);
    }

    #[test]
    fn test_sniff_truncated_signature() {
        assert_eq!(sniff(b"PK\x03"), None);
        assert_eq!(sniff(&[0x37, 0x7A, 0xBC]), None);
    }

    #[test]
    fn test_sniff_ignores_bytes_past_signature_window() {
        let mut head = vec![b'x'; 8];
        head.extend_from_slice(b"PK\x03\x04");
        assert_eq!(sniff(&head), None);
    }

    #[test]
    fn test_sniff_reader() {
        assert_eq!(sniff_reader(&b"PK\x03\x04\x14\x00"[..]), Some(ArchiveFormat::Zip));
        assert_eq!(sniff_reader(&b""[..]), None);
        assert_eq!(sniff_reader(&b"0123456789"[..]), None);
    }

    #[test]
    fn test_identify_ustar_at_offset() {
        let mut block = vec![0u8; 512];
        block[257..262].copy_from_slice(b"ustar");
        let mut cursor = Cursor::new(block);
        assert_eq!(identify("data.bin", &mut cursor).unwrap(), ArchiveFormat::Tar);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_identify_tar_name_hint() {
        let mut cursor = Cursor::new(vec![1u8; 1024]);
        assert_eq!(identify("old.TAR", &mut cursor).unwrap(), ArchiveFormat::Tar);
    }

    #[test]
    fn test_identify_unrecognized() {
        let mut cursor = Cursor::new(b"0123456789".to_vec());
        let err = identify("notes.txt", &mut cursor).unwrap_err();
        assert!(matches!(err, ArchiveError::UnrecognizedFormat { ref name } if name == "notes.txt"));
    }

    #[test]
    fn test_identify_empty_source() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(identify("a.zip", &mut cursor).is_err());
    }

    #[test]
    fn test_supports_password() {
        assert!(ArchiveFormat::Zip.supports_password());
        assert!(ArchiveFormat::SevenZ.supports_password());
        assert!(ArchiveFormat::Rar.supports_password());
        assert!(!ArchiveFormat::Tar.supports_password());
        assert!(!ArchiveFormat::Gzip.supports_password());
        assert!(!ArchiveFormat::Bzip2.supports_password());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(ArchiveFormat::SevenZ.to_string(), "7z");
        assert_eq!(format!("{:?}", ArchiveFormat::SevenZ), "SevenZ");
    }
}

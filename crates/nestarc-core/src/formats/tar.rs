//! Tar reader.

use std::io::Read;

use crate::Result;
use crate::error::ArchiveError;
use crate::formats::ArchiveFormat;
use crate::formats::traits::EntryMeta;
use crate::formats::traits::EntryVisitor;
use crate::formats::traits::FormatReader;

/// Tar archive reader.
///
/// Only regular files and directories are reported; links, devices and
/// other special entries carry no content and are skipped.
pub struct TarReader<R: Read> {
    archive: tar::Archive<R>,
    reported_as: ArchiveFormat,
}

impl<R: Read> TarReader<R> {
    /// Creates a reader over an uncompressed tar stream.
    pub fn new(source: R) -> Self {
        Self::reported_as(source, ArchiveFormat::Tar)
    }

    /// Creates a reader whose entries report `format` as their container,
    /// used for tar payloads inside gzip or bzip2 streams.
    pub fn reported_as(source: R, format: ArchiveFormat) -> Self {
        Self {
            archive: tar::Archive::new(source),
            reported_as: format,
        }
    }
}

impl<R: Read> FormatReader for TarReader<R> {
    fn format(&self) -> ArchiveFormat {
        self.reported_as
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| ArchiveError::InvalidArchive(format!("tar: {e}")))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| ArchiveError::InvalidArchive(format!("tar: {e}")))?;
            let entry_type = entry.header().entry_type();
            if !entry_type.is_file() && !entry_type.is_dir() {
                log::trace!("skipping tar entry of type {entry_type:?}");
                continue;
            }

            let meta = EntryMeta {
                name: String::from_utf8_lossy(&entry.path_bytes()).into_owned(),
                size: Some(entry.size()),
                is_dir: entry_type.is_dir(),
                encrypted: false,
                format: self.reported_as,
            };
            visit(&meta, &mut entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::TarTestBuilder;
    use crate::test_utils::create_test_tar;

    fn collect(data: &[u8]) -> Vec<(String, bool, Vec<u8>)> {
        let mut reader = TarReader::new(data);
        let mut out = Vec::new();
        reader
            .for_each_entry(&mut |meta, content| {
                let mut buf = Vec::new();
                content.read_to_end(&mut buf)?;
                out.push((meta.name.clone(), meta.is_dir, buf));
                Ok(())
            })
            .unwrap();
        out
    }

    #[test]
    fn test_files_in_order() {
        let data = create_test_tar(vec![("a.txt", b"alpha"), ("dir/b.txt", b"beta")]);
        let entries = collect(&data);
        assert_eq!(
            entries,
            vec![
                ("a.txt".to_owned(), false, b"alpha".to_vec()),
                ("dir/b.txt".to_owned(), false, b"beta".to_vec()),
            ]
        );
    }

    #[test]
    fn test_directories_and_links() {
        let data = TarTestBuilder::new()
            .add_directory("dir/")
            .add_file("dir/file.txt", b"content")
            .add_symlink("dir/link", "file.txt")
            .build();
        let entries = collect(&data);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].1);
        assert_eq!(entries[1].0, "dir/file.txt");
    }

    #[test]
    fn test_reported_format() {
        let reader = TarReader::reported_as(&b""[..], ArchiveFormat::Gzip);
        assert_eq!(reader.format(), ArchiveFormat::Gzip);
    }

    #[test]
    fn test_empty_tar() {
        let data = create_test_tar(vec![]);
        assert!(collect(&data).is_empty());
    }
}

//! Test utilities for building nested archives in memory.
//!
//! Every supported container except RAR can be produced here, including
//! encrypted zip and 7z archives and solid 7z blocks. RAR tests read small
//! fixtures from `tests/fixtures/`.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use zip::AesMode;
use zip::unstable::write::FileOptionsExt;
use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

/// Creates an in-memory TAR archive from a list of entries.
///
/// # Examples
///
/// ```
/// use nestarc_core::test_utils::create_test_tar;
///
/// let tar_data = create_test_tar(vec![("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// assert!(nestarc_core::formats::detect::is_ustar(&tar_data));
/// ```
#[must_use]
pub fn create_test_tar(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    let mut builder = TarTestBuilder::new();
    for (path, data) in entries {
        builder = builder.add_file(path, data);
    }
    builder.build()
}

/// Creates an in-memory ZIP archive with stored (uncompressed) entries.
///
/// # Examples
///
/// ```
/// use nestarc_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(vec![("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// assert_eq!(&zip_data[..4], b"PK\x03\x04");
/// ```
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    for (path, data) in entries {
        builder = builder.add_file(path, data);
    }
    builder.build()
}

/// Creates a ZIP archive whose entries are all AES-256 encrypted.
#[must_use]
pub fn create_encrypted_zip(entries: Vec<(&str, &[u8])>, password: &str) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    for (path, data) in entries {
        builder = builder.add_encrypted_file(path, data, password);
    }
    builder.build()
}

/// Creates a ZIP archive whose entries are all ZipCrypto encrypted.
#[must_use]
pub fn create_zipcrypto_zip(entries: Vec<(&str, &[u8])>, password: &str) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    for (path, data) in entries {
        builder = builder.add_zipcrypto_file(path, data, password);
    }
    builder.build()
}

/// Creates an in-memory 7z archive, AES encrypted when `password` is set.
///
/// # Examples
///
/// ```
/// use nestarc_core::test_utils::create_test_7z;
///
/// let data = create_test_7z(vec![("y.txt", b"inner")], Some("222"));
/// assert_eq!(&data[..6], &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C]);
/// ```
#[must_use]
pub fn create_test_7z(entries: Vec<(&str, &[u8])>, password: Option<&str>) -> Vec<u8> {
    use sevenz_rust2::ArchiveEntry;
    use sevenz_rust2::ArchiveWriter;
    use sevenz_rust2::EncoderMethod;
    use sevenz_rust2::Password;
    use sevenz_rust2::encoder_options::AesEncoderOptions;

    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    if let Some(password) = password {
        writer.set_content_methods(vec![
            AesEncoderOptions::new(Password::from(password)).into(),
            EncoderMethod::LZMA2.into(),
        ]);
    }
    for (path, data) in entries {
        writer
            .push_archive_entry(ArchiveEntry::new_file(path), Some(data))
            .unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Creates a 7z archive whose entries share one solid block, so each entry
/// decodes from where the previous one ended.
#[must_use]
pub fn create_solid_7z(entries: Vec<(&str, &[u8])>, password: Option<&str>) -> Vec<u8> {
    use sevenz_rust2::ArchiveEntry;
    use sevenz_rust2::ArchiveWriter;
    use sevenz_rust2::EncoderMethod;
    use sevenz_rust2::Password;
    use sevenz_rust2::SourceReader;
    use sevenz_rust2::encoder_options::AesEncoderOptions;

    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    if let Some(password) = password {
        writer.set_content_methods(vec![
            AesEncoderOptions::new(Password::from(password)).into(),
            EncoderMethod::LZMA2.into(),
        ]);
    }
    let (names, readers): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .map(|(path, data)| (ArchiveEntry::new_file(path), SourceReader::new(data)))
        .unzip();
    writer.push_archive_entries(names, readers).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Compresses `data` into a gzip stream.
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Compresses `data` into a bzip2 stream.
#[must_use]
pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builder for TAR test archives.
///
/// # Examples
///
/// ```
/// use nestarc_core::test_utils::TarTestBuilder;
///
/// let tar_data = TarTestBuilder::new()
///     .add_directory("dir/")
///     .add_file("dir/file.txt", b"content")
///     .add_symlink("link", "dir/file.txt")
///     .build();
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Creates a new TAR test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Adds a regular file.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds a symlink.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o777);
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Builds and returns the TAR archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for ZIP test archives mixing plain and encrypted entries.
///
/// # Examples
///
/// ```
/// use nestarc_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_directory("dir/")
///     .add_file("dir/plain.txt", b"content")
///     .add_encrypted_file("secret.txt", b"hidden", "pw")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn stored() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o644)
    }

    /// Adds a stored file.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        self.zip.start_file(path, Self::stored()).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a deflate-compressed file.
    #[must_use]
    pub fn add_deflated_file(mut self, path: &str, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds an AES-256 encrypted file.
    #[must_use]
    pub fn add_encrypted_file(mut self, path: &str, data: &[u8], password: &str) -> Self {
        let options = Self::stored().with_aes_encryption(AesMode::Aes256, password);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a ZipCrypto encrypted file.
    #[must_use]
    pub fn add_zipcrypto_file(mut self, path: &str, data: &[u8], password: &str) -> Self {
        let options = Self::stored().with_deprecated_encryption(password.as_bytes()).unwrap();
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Builds and returns the ZIP archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

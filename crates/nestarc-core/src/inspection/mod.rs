//! Archive inspection.
//!
//! [`ArchiveFile::info`](crate::ArchiveFile::info) walks an archive and the
//! nested archives its policy can open, mirroring every entry into an
//! [`InfoTree`]. Nested archives whose password is missing or wrong are
//! mounted but not entered, and reported as password failures.
//!
//! # Examples
//!
//! ```
//! use nestarc_core::ArchiveFile;
//! use nestarc_core::test_utils::create_test_zip;
//! use std::io::Cursor;
//!
//! let inner = create_test_zip(vec![("y.txt", b"inner")]);
//! let data = create_test_zip(vec![("x.txt", b"hello"), ("b.zip", &inner)]);
//! let mut file = ArchiveFile::new("a.zip", Cursor::new(data))?;
//!
//! let (tree, result) = file.info(&["a.zip/*.txt"]);
//! result?;
//! assert!(tree.get("a.zip/b.zip/y.txt").is_some());
//! assert_eq!(tree.previews().len(), 1);
//! # Ok::<(), nestarc_core::ArchiveError>(())
//! ```

pub(crate) mod info;
pub mod tree;

pub use tree::FileInfo;
pub use tree::InfoTree;

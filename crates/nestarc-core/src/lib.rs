//! Nested archive traversal with per-path password policies.
//!
//! `nestarc-core` walks zip, 7z, rar, tar, gzip and bzip2 archives, descends
//! into archives stored inside other archives and decides which password to
//! use for every nested file from a [`PolicyTree`] keyed by logical path
//! (`a.zip/dir/b.7z/y.txt`).
//!
//! # Examples
//!
//! ```
//! use nestarc_core::ArchiveFile;
//! use nestarc_core::password_failures;
//! use nestarc_core::test_utils::create_encrypted_zip;
//! use nestarc_core::test_utils::create_test_7z;
//! use std::io::Cursor;
//!
//! let inner = create_test_7z(vec![("y.txt", b"inner")], Some("222"));
//! let outer = create_encrypted_zip(vec![("x.txt", b"outer"), ("b.7z", &inner)], "111");
//!
//! let mut file = ArchiveFile::new("a.zip", Cursor::new(outer))?;
//! file.set_password("111")?;
//!
//! let (tree, result) = file.info(&[]);
//! let failures = password_failures(&result.unwrap_err()).unwrap_or_default();
//! assert_eq!(failures.len(), 1);
//! assert_eq!(failures[0].filename, "a.zip/b.7z");
//! assert!(tree.get("a.zip/x.txt").is_some());
//! # Ok::<(), nestarc_core::ArchiveError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod cancel;
pub mod config;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod inspection;
pub mod io;
pub mod path;
pub mod policy;
#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use archive::ArchiveFile;
pub use cancel::CancellationToken;
pub use config::HEAD_SIZE;
pub use config::SPILL_THRESHOLD;
pub use config::TraversalConfig;
pub use error::ArchiveError;
pub use error::PasswordFailure;
pub use error::Result;
pub use error::password_failures;
pub use extraction::Entry;
pub use extraction::NestedProbe;
pub use extraction::Visit;
pub use formats::ArchiveFormat;
pub use formats::EntryMeta;
pub use inspection::FileInfo;
pub use inspection::InfoTree;
pub use policy::PolicyTree;

//! Archive format implementations.
//!
//! Formats are identified by content. Each level of a traversal builds one
//! [`Extractor`] through [`identify`] and iterates its entries in archive
//! order.

pub mod compressed;
pub mod detect;
pub mod dispatch;
#[cfg(feature = "rar")]
pub mod rar;
pub mod sevenz;
pub mod tar;
pub mod traits;
pub mod zip;

// Re-export main types for convenience
pub use detect::ArchiveFormat;
pub use dispatch::Extractor;
pub use dispatch::identify;
pub use traits::EntryMeta;
pub use traits::EntryVisitor;
pub use traits::FormatReader;

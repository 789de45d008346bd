//! I/O helpers for nested traversal.
//!
//! This module provides the reader wrappers the walker composes at every
//! nesting level.

use std::io::Read;
use std::io::Seek;

pub mod composite;
pub mod spill;

// Re-export main types for convenience
pub use composite::CompositeReader;
pub use spill::Spill;
pub use spill::SpillTarget;

/// Seekable byte source an archive is read from.
pub trait Source: Read + Seek {}

impl<T: Read + Seek + ?Sized> Source for T {}

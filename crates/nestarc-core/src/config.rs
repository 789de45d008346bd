//! Traversal configuration.

use std::path::Path;
use std::path::PathBuf;

use crate::cancel::CancellationToken;

/// Entries whose declared size is at least this many bytes are spilled to a
/// temporary file instead of memory before recursing into them.
pub const SPILL_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Number of bytes sniffed from the start of every entry.
pub const HEAD_SIZE: usize = 64;

/// Configuration shared by every level of one traversal.
///
/// # Examples
///
/// ```
/// use nestarc_core::{CancellationToken, TraversalConfig};
///
/// let token = CancellationToken::new();
/// let config = TraversalConfig::default()
///     .with_temp_dir(std::env::temp_dir())
///     .with_cancellation(token.clone());
///
/// assert!(!config.cancellation().is_cancelled());
/// token.cancel();
/// assert!(config.cancellation().is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraversalConfig {
    /// Directory for spilled entries. `None` uses the system temp directory.
    pub temp_dir: Option<PathBuf>,

    /// Token checked before every entry.
    pub cancellation: CancellationToken,
}

impl TraversalConfig {
    /// Sets the directory used for temporary spill files.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the directory spill files are created in.
    pub fn spill_dir(&self) -> PathBuf {
        self.temp_dir
            .as_deref()
            .map_or_else(std::env::temp_dir, Path::to_path_buf)
    }

    /// Returns the cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

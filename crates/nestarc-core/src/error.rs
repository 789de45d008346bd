//! Error types for nested archive traversal.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while identifying, walking or inspecting archives.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Content does not match any known archive signature.
    #[error("{name}: unrecognized archive format")]
    UnrecognizedFormat {
        /// Name hint of the source that failed identification.
        name: String,
    },

    /// A password was supplied for a format without password support.
    #[error("{name}: {format} does not support passwords")]
    PasswordUnsupported {
        /// Name hint of the source.
        name: String,
        /// Format name reported by the identifier.
        format: &'static str,
    },

    /// Archive is corrupted or cannot be decoded.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An encrypted entry was opened without a password.
    #[error("password required")]
    PasswordRequired,

    /// A password was supplied but decryption still failed.
    #[error("password invalid")]
    PasswordInvalid,

    /// Failure attributed to one logical path inside the traversal.
    #[error("{path}: {source}")]
    Entry {
        /// Logical path of the offending file.
        path: String,
        /// Underlying failure.
        #[source]
        source: Box<ArchiveError>,
    },

    /// Several independent failures collected during one traversal.
    #[error("{}", display_joined(.0))]
    Joined(Vec<ArchiveError>),

    /// Fewer bytes were copied than the entry header declared.
    #[error("failed to read {path}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Logical path of the entry.
        path: String,
        /// Size declared by the archive.
        expected: u64,
        /// Bytes actually copied.
        actual: u64,
    },

    /// Temporary file or directory could not be created or written.
    #[error("temporary resource {path}: {source}")]
    TempResource {
        /// Path that was being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Traversal was cancelled through its cancellation token.
    #[error("traversal cancelled")]
    Cancelled,

    /// A policy path does not belong to the policy tree.
    #[error("{path} is not in the policy tree rooted at {root}")]
    PolicyPath {
        /// Offending path.
        path: String,
        /// Name of the tree root.
        root: String,
    },

    /// Filename given to the constructor is empty or degenerate.
    #[error("filename is invalid: {0:?}")]
    InvalidFilename(String),

    /// A preview glob could not be compiled.
    #[error("invalid preview pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Pattern as supplied.
        pattern: String,
        /// Parser message.
        reason: String,
    },
}

impl From<std::io::Error> for ArchiveError {
    /// Converts an I/O error, unwrapping an `ArchiveError` that a decoding
    /// reader smuggled through the `Read` interface.
    fn from(err: std::io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Self>()) {
            return Self::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Self>()) {
            Some(Ok(inner)) => *inner,
            _ => Self::Io(kind.into()),
        }
    }
}

impl From<ArchiveError> for std::io::Error {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Io(io) => io,
            other => Self::other(other),
        }
    }
}

fn display_joined(errors: &[ArchiveError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ArchiveError {
    /// Wraps an error with the logical path of the file it belongs to.
    pub fn at(path: impl Into<String>, source: Self) -> Self {
        Self::Entry {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Joins two errors, flattening existing joins on either side.
    ///
    /// # Examples
    ///
    /// ```
    /// use nestarc_core::ArchiveError;
    ///
    /// let err = ArchiveError::join(ArchiveError::Cancelled, ArchiveError::PasswordRequired);
    /// let err = ArchiveError::join(err, ArchiveError::PasswordInvalid);
    /// assert!(matches!(err, ArchiveError::Joined(ref all) if all.len() == 3));
    /// ```
    #[must_use]
    pub fn join(first: Self, second: Self) -> Self {
        let mut errors = first.into_vec();
        errors.extend(second.into_vec());
        Self::Joined(errors)
    }

    /// Joins an optional error with another one.
    #[must_use]
    pub fn join_opt(first: Option<Self>, second: Self) -> Self {
        match first {
            Some(first) => Self::join(first, second),
            None => second,
        }
    }

    fn into_vec(self) -> Vec<Self> {
        match self {
            Self::Joined(errors) => errors,
            other => vec![other],
        }
    }

    /// Returns `true` if this error, or anything joined into it, is a
    /// path-tagged password failure.
    #[must_use]
    pub fn is_password_failure(&self) -> bool {
        password_failures(self).is_some()
    }

    /// Returns `true` if the innermost cause is a password failure.
    #[must_use]
    pub fn is_password_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::PasswordRequired | Self::PasswordInvalid
        )
    }

    /// Returns `true` if the innermost cause is content that carries an
    /// archive signature but does not decode.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::InvalidArchive(_) | Self::UnrecognizedFormat { .. }
        )
    }

    /// Returns `true` if the traversal was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Entry { source, .. } => source.is_cancelled(),
            Self::Joined(errors) => errors.iter().any(Self::is_cancelled),
            _ => false,
        }
    }

    /// Returns the innermost error behind any `Entry` wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Entry { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::Entry { path, .. } | Self::ShortRead { path, .. } => Some(path),
            Self::UnrecognizedFormat { name } | Self::PasswordUnsupported { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }
}

/// One nested file that could not be opened because of its password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordFailure {
    /// Logical path of the file.
    pub filename: String,
    /// No password was supplied for the file.
    pub password_required: bool,
    /// A password was supplied but did not decrypt the file.
    pub password_invalid: bool,
}

impl fmt::Display for PasswordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.password_invalid {
            write!(f, "Password invalid: {}", self.filename)
        } else {
            write!(f, "Password required: {}", self.filename)
        }
    }
}

/// Flattens a (possibly joined) error into its path-tagged password failures.
///
/// Returns `None` when the error contains no path-tagged failure at all.
///
/// # Examples
///
/// ```
/// use nestarc_core::{ArchiveError, password_failures};
///
/// let err = ArchiveError::join(
///     ArchiveError::at("a.zip/b.7z", ArchiveError::PasswordRequired),
///     ArchiveError::at("a.zip/c.zip", ArchiveError::PasswordInvalid),
/// );
/// let failures = password_failures(&err).unwrap();
/// assert_eq!(failures.len(), 2);
/// assert!(failures[0].password_required);
/// assert!(failures[1].password_invalid);
/// ```
#[must_use]
pub fn password_failures(err: &ArchiveError) -> Option<Vec<PasswordFailure>> {
    let mut failures = Vec::new();
    collect_password_failures(err, &mut failures);
    if failures.is_empty() {
        None
    } else {
        Some(failures)
    }
}

fn collect_password_failures(err: &ArchiveError, out: &mut Vec<PasswordFailure>) {
    match err {
        ArchiveError::Joined(errors) => {
            for inner in errors {
                collect_password_failures(inner, out);
            }
        }
        ArchiveError::Entry { path, source } => match source.root_cause() {
            ArchiveError::PasswordRequired => out.push(PasswordFailure {
                filename: path.clone(),
                password_required: true,
                password_invalid: false,
            }),
            ArchiveError::PasswordInvalid => out.push(PasswordFailure {
                filename: path.clone(),
                password_required: false,
                password_invalid: true,
            }),
            ArchiveError::Joined(_) => collect_password_failures(source, out),
            _ => {}
        },
        _ => {}
    }
}

//! The archive being traversed.

use std::io::Read;
use std::io::Seek;

use crate::Result;
use crate::config::TraversalConfig;
use crate::error::ArchiveError;
use crate::extraction::entry::Entry;
use crate::extraction::entry::Visit;
use crate::extraction::probe;
use crate::extraction::walker;
use crate::inspection::InfoTree;
use crate::inspection::info;
use crate::io::Source;
use crate::path;
use crate::policy::PolicyTree;

/// Policy tree of a traversal: owned by the top-level file, borrowed by every
/// nested file forked from it.
#[derive(Debug)]
pub(crate) enum PolicyRef<'a> {
    Owned(PolicyTree),
    Borrowed(&'a mut PolicyTree),
}

impl PolicyRef<'_> {
    pub(crate) fn get(&self) -> &PolicyTree {
        match self {
            Self::Owned(tree) => tree,
            Self::Borrowed(tree) => tree,
        }
    }

    pub(crate) fn get_mut(&mut self) -> &mut PolicyTree {
        match self {
            Self::Owned(tree) => tree,
            Self::Borrowed(tree) => tree,
        }
    }
}

/// One archive being processed, either the top-level file or a nested
/// archive forked during traversal.
///
/// The logical path of a file is the chain of enclosing archive names
/// followed by its own name, e.g. `a.zip/dir/b.7z`. Passwords, discards and
/// extract flags are looked up by logical path in a single [`PolicyTree`]
/// shared by every nesting level.
///
/// # Examples
///
/// ```
/// use nestarc_core::ArchiveFile;
/// use nestarc_core::Visit;
/// use nestarc_core::test_utils::create_test_zip;
/// use std::io::Cursor;
/// use std::io::Read;
///
/// let data = create_test_zip(vec![("x.txt", b"hello"), ("junk/y.txt", b"skip me")]);
/// let mut file = ArchiveFile::new("a.zip", Cursor::new(data))?;
/// file.discard_entry("a.zip/junk")?;
///
/// let mut seen = Vec::new();
/// file.extract(|entry| {
///     let mut text = String::new();
///     entry.read_to_string(&mut text)?;
///     seen.push((entry.path().to_owned(), text));
///     Ok(Visit::Continue)
/// })?;
/// assert_eq!(seen, vec![("a.zip/x.txt".to_owned(), "hello".to_owned())]);
/// # Ok::<(), nestarc_core::ArchiveError>(())
/// ```
pub struct ArchiveFile<'a> {
    name: String,
    filename: String,
    hosts: Vec<String>,
    reader: Box<dyn Source + 'a>,
    policy: PolicyRef<'a>,
    config: TraversalConfig,
}

impl std::fmt::Debug for ArchiveFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFile")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("hosts", &self.hosts)
            .finish_non_exhaustive()
    }
}

impl<'a> ArchiveFile<'a> {
    /// Creates a top-level file from a display filename and a seekable source.
    ///
    /// The filename is trimmed and normalized; its last segment becomes the
    /// file's name and the root of its policy tree.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidFilename`] if the filename is blank or
    /// normalizes to nothing.
    pub fn new<R: Read + Seek + 'a>(filename: &str, source: R) -> Result<Self> {
        let normalized = path::normalize(filename);
        let name = path::base_name(&normalized).to_owned();
        if name.is_empty() {
            return Err(ArchiveError::InvalidFilename(filename.to_owned()));
        }
        Ok(Self {
            policy: PolicyRef::Owned(PolicyTree::with_root(name.clone())),
            name,
            filename: normalized,
            hosts: Vec::new(),
            reader: Box::new(source),
            config: TraversalConfig::default(),
        })
    }

    /// Builds a nested file sharing `policy` with its host.
    pub(crate) fn nested(
        name: &str,
        hosts: Vec<String>,
        reader: Box<dyn Source + 'a>,
        policy: &'a mut PolicyTree,
        config: TraversalConfig,
    ) -> Self {
        let mut filename = hosts.join("/");
        filename = path::join(&filename, name);
        Self {
            name: name.to_owned(),
            filename,
            hosts,
            reader,
            policy: PolicyRef::Borrowed(policy),
            config,
        }
    }

    /// Replaces the traversal configuration.
    #[must_use]
    pub fn with_config(mut self, config: TraversalConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the policy tree, e.g. one restored from an earlier session.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyTree) -> Self {
        self.policy = PolicyRef::Owned(policy);
        self
    }

    /// Returns the name of the file within its host (or its base name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized filename: the path as supplied for a top-level
    /// file, the full logical path for a nested one.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the names of the enclosing archives, outermost first.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Returns the logical path of this file.
    pub fn path(&self) -> String {
        self.hosts
            .iter()
            .chain(std::iter::once(&self.name))
            .fold(String::new(), |acc, segment| path::join(&acc, segment))
    }

    /// Returns the traversal configuration.
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Returns the policy tree.
    pub fn policy(&self) -> &PolicyTree {
        self.policy.get()
    }

    /// Sets the password of this file.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        let path = self.path();
        self.policy.get_mut().set_password(&path, password)
    }

    /// Sets the password of a nested archive and enables descending into it.
    ///
    /// A blank path is ignored.
    pub fn set_entry_password(&mut self, path: &str, password: &str) -> Result<()> {
        if path::segments(path).is_empty() {
            return Ok(());
        }
        let policy = self.policy.get_mut();
        policy.set_password(path, password)?;
        policy.set_extracted(path)
    }

    /// Enables descending into the nested archive at `path`.
    pub fn extracted_entry(&mut self, path: &str) -> Result<()> {
        self.policy.get_mut().set_extracted(path)
    }

    /// Skips `path` and everything below it during traversal.
    ///
    /// A blank path is ignored.
    pub fn discard_entry(&mut self, path: &str) -> Result<()> {
        if path::segments(path).is_empty() {
            return Ok(());
        }
        self.policy.get_mut().set_discard(path)
    }

    /// Returns `true` if any entry refuses to open without a password.
    ///
    /// The source is rewound afterwards.
    pub fn encrypted(&mut self) -> Result<bool> {
        probe::encrypted(&self.name, &mut *self.reader, &self.config)
    }

    /// Walks every entry depth-first, descending into nested archives whose
    /// logical path is flagged for extraction.
    ///
    /// The handler sees directories, regular files and nested archives in
    /// archive order. Returning [`Visit::Skip`] from a nested archive keeps
    /// the walker from descending into it.
    ///
    /// # Errors
    ///
    /// Fails on the first hard error: unreadable or undecryptable content, a
    /// short entry, a temp-file failure, cancellation or a handler error. The
    /// error is tagged with the logical path it belongs to.
    pub fn extract<F>(&mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(&mut Entry<'_>) -> Result<Visit>,
    {
        walker::walk(self, &mut handler)
    }

    /// Builds the entry tree, capturing the content of leaves whose logical
    /// path matches one of `previews`.
    ///
    /// The tree is returned even when the walk fails; the error then holds
    /// every nested archive whose password was missing or wrong, joined with
    /// any hard failure.
    pub fn info(&mut self, previews: &[&str]) -> (InfoTree, Result<()>) {
        info::build(self, previews)
    }

    /// Checks that every entry of this file opens, without descending.
    pub fn validate(&mut self) -> Result<()> {
        let path = self.path();
        let encrypted = self.encrypted()?;
        let password = if encrypted {
            self.policy.get().password(&path).to_owned()
        } else {
            String::new()
        };
        probe::validate(&self.name, &mut *self.reader, &password, &self.config)
            .map_err(|err| ArchiveError::at(path, err))
    }

    /// Rewinds the source to its start.
    pub fn reset(&mut self) -> Result<()> {
        self.reader.rewind()?;
        Ok(())
    }

    /// Splits the file into the parts one walk level borrows independently.
    pub(crate) fn parts(&mut self) -> Parts<'_> {
        Parts {
            name: &self.name,
            hosts: &self.hosts,
            reader: &mut *self.reader,
            policy: self.policy.get_mut(),
            config: &self.config,
        }
    }
}

/// Disjoint borrows of an [`ArchiveFile`] for one walk level.
pub(crate) struct Parts<'p> {
    pub(crate) name: &'p str,
    pub(crate) hosts: &'p [String],
    pub(crate) reader: &'p mut dyn Source,
    pub(crate) policy: &'p mut PolicyTree,
    pub(crate) config: &'p TraversalConfig,
}

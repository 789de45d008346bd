//! Entries handed to extraction handlers.

use std::io;
use std::io::Read;
use std::io::Seek;

use crate::Result;
use crate::config::TraversalConfig;
use crate::extraction::probe;
use crate::formats::ArchiveFormat;
use crate::formats::EntryMeta;
use crate::io::CompositeReader;
use crate::io::Spill;
use crate::policy::PolicyTree;

/// What the walker does after a handler returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visit {
    /// Keep going, descending into the entry if it is an archive flagged
    /// for extraction.
    #[default]
    Continue,
    /// Do not descend into this entry.
    Skip,
}

/// Encryption state of a nested archive, reported by [`Entry::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedProbe {
    /// Detected format.
    pub format: ArchiveFormat,
    /// Some entry refuses to open without a password.
    pub encrypted: bool,
    /// Password the policy resolves for the archive (empty when not
    /// encrypted).
    pub password: String,
    /// The archive is encrypted and the resolved password is missing or
    /// does not decrypt it.
    pub password_invalid: bool,
}

pub(crate) enum Content<'e> {
    Empty,
    Stream(CompositeReader<&'e mut dyn Read>),
    /// Nested archive not yet copied out of its host.
    Pending(CompositeReader<&'e mut dyn Read>),
    Spilled(Spill),
}

/// One item visited by [`ArchiveFile::extract`](crate::ArchiveFile::extract).
///
/// Reading an entry yields its full content. An entry is only valid for the
/// duration of the handler call.
pub struct Entry<'e> {
    path: String,
    meta: &'e EntryMeta,
    archived: Option<ArchiveFormat>,
    content: Content<'e>,
    policy: &'e mut PolicyTree,
    config: &'e TraversalConfig,
}

impl<'e> Entry<'e> {
    pub(crate) fn new(
        path: String,
        meta: &'e EntryMeta,
        archived: Option<ArchiveFormat>,
        content: Content<'e>,
        policy: &'e mut PolicyTree,
        config: &'e TraversalConfig,
    ) -> Self {
        Self {
            path,
            meta,
            archived,
            content,
            policy,
            config,
        }
    }

    /// Logical path, e.g. `a.zip/dir/b.7z/y.txt`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name inside the containing archive.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Metadata reported by the containing archive.
    pub fn meta(&self) -> &EntryMeta {
        self.meta
    }

    /// Returns `true` for directories.
    pub fn is_dir(&self) -> bool {
        self.meta.is_dir
    }

    /// Format of the nested archive, if the content starts with a known
    /// signature.
    pub fn archived(&self) -> Option<ArchiveFormat> {
        self.archived
    }

    /// Returns the policy tree of the traversal.
    pub fn policy(&self) -> &PolicyTree {
        self.policy
    }

    /// Flags this entry so the walker descends into it after the handler
    /// returns.
    pub fn mark_extracted(&mut self) -> Result<()> {
        self.policy.set_extracted(&self.path)
    }

    /// Probes a nested archive for encryption and checks the password the
    /// policy resolves for it.
    ///
    /// Returns `None` for entries that are not archives. The content is
    /// copied out of its host first, so the entry can still be read or
    /// descended into afterwards.
    pub fn probe(&mut self) -> Result<Option<NestedProbe>> {
        let Some(format) = self.archived else {
            return Ok(None);
        };
        self.spill()?;
        let Content::Spilled(spill) = &mut self.content else {
            return Ok(None);
        };

        let name = self.meta.name.as_str();
        let encrypted = probe::encrypted(name, spill, self.config)?;
        let password = if encrypted {
            self.policy.password(&self.path).to_owned()
        } else {
            String::new()
        };
        let password_invalid =
            encrypted && !probe::password_opens(name, spill, &password, self.config)?;
        spill.rewind()?;

        log::debug!(
            "probed {}: {format}, encrypted={encrypted}, password_invalid={password_invalid}",
            self.path
        );
        Ok(Some(NestedProbe {
            format,
            encrypted,
            password,
            password_invalid,
        }))
    }

    /// Copies pending archive content into a seekable spill.
    fn spill(&mut self) -> Result<()> {
        if let Content::Pending(reader) = &mut self.content {
            let spill = Spill::fill(reader, self.meta.size, &self.path, self.config)?;
            self.content = Content::Spilled(spill);
        }
        Ok(())
    }

    /// Consumes the entry, returning its archive content rewound to the
    /// start. Plain files and directories yield `None`.
    pub(crate) fn into_spill(mut self) -> Result<Option<Spill>> {
        self.spill()?;
        match self.content {
            Content::Spilled(mut spill) => {
                spill.rewind()?;
                Ok(Some(spill))
            }
            _ => Ok(None),
        }
    }
}

impl Read for Entry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.spill()?;
        match &mut self.content {
            Content::Empty => Ok(0),
            Content::Stream(reader) | Content::Pending(reader) => reader.read(buf),
            Content::Spilled(spill) => spill.read(buf),
        }
    }
}

impl std::fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("path", &self.path)
            .field("meta", self.meta)
            .field("archived", &self.archived)
            .finish_non_exhaustive()
    }
}
